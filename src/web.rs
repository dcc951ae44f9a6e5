//! Web search adapter backed by a Custom Search JSON API.
//!
//! Sends `GET {endpoint}?key=…&cx=…&q=…&num=…` and maps the top
//! `items[].{title, snippet, link}` into [`SearchItem`]s tagged
//! [`SourceTag::Web`].
//!
//! # Failure Mapping
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Endpoint blank or unparsable, API key or engine id env var unset/empty | `NotConfigured` |
//! | Transport error, timeout, non-2xx status | `UpstreamUnavailable` |
//! | Body is not JSON, or `items` is not an array | `UpstreamProtocolError` |
//! | No `items` field | empty success |
//!
//! Credentials are read from the environment on every call so that a key
//! exported after startup is picked up without a restart.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::{WebConfig, WEB_RESULT_LIMIT};
use crate::error::{parse_endpoint, truncate_body, AdapterError, AdapterResult};
use crate::models::{Query, SearchItem, SourceTag};
use crate::traits::SearchAdapter;

const NAME: &str = "google";

pub struct WebSearch {
    client: reqwest::Client,
    endpoint: Option<reqwest::Url>,
    api_key_env: String,
    engine_id_env: String,
    max_results: usize,
}

impl WebSearch {
    pub fn new(config: &WebConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: parse_endpoint(&config.endpoint),
            api_key_env: config.api_key_env.clone(),
            engine_id_env: config.engine_id_env.clone(),
            max_results: config.max_results.clamp(1, WEB_RESULT_LIMIT),
        })
    }

    fn credentials(&self) -> AdapterResult<(String, String)> {
        let key = read_env(&self.api_key_env)?;
        let cx = read_env(&self.engine_id_env)?;
        Ok((key, cx))
    }
}

fn read_env(var: &str) -> AdapterResult<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AdapterError::not_configured(NAME, format!("{} not set", var))),
    }
}

#[async_trait]
impl SearchAdapter for WebSearch {
    fn name(&self) -> &str {
        NAME
    }

    async fn resolve(&self, query: &Query, _ctx: &[SearchItem]) -> AdapterResult<Vec<SearchItem>> {
        let endpoint = self
            .endpoint
            .clone()
            .ok_or_else(|| AdapterError::not_configured(NAME, "endpoint not set"))?;
        let (key, cx) = self.credentials()?;
        let num = self.max_results.to_string();

        let response = self
            .client
            .get(endpoint)
            .query(&[
                ("key", key.as_str()),
                ("cx", cx.as_str()),
                ("q", query.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AdapterError::unavailable(NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(AdapterError::unavailable(
                NAME,
                format!("HTTP {}: {}", status, truncate_body(&body_text, 200)),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::unavailable(NAME, e.to_string()))?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| AdapterError::protocol(NAME, format!("invalid JSON: {}", e)))?;

        let items = parse_web_response(&json, self.max_results)?;
        debug!(query = %query, results = items.len(), "web search returned");
        Ok(items)
    }
}

/// Map a Custom Search response body to at most `limit` search items.
///
/// Entries without a `link` are skipped.
pub fn parse_web_response(json: &Value, limit: usize) -> AdapterResult<Vec<SearchItem>> {
    let items = match json.get("items") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(AdapterError::protocol(NAME, "'items' is not an array")),
    };

    let text = |item: &Value, field: &str| {
        item.get(field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    Ok(items
        .iter()
        .filter(|item| item.get("link").and_then(|l| l.as_str()).is_some())
        .take(limit)
        .map(|item| SearchItem {
            title: text(item, "title"),
            snippet: text(item, "snippet"),
            link: text(item, "link"),
            source: SourceTag::Web,
        })
        .collect())
}
