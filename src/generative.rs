//! Generative answer adapter backed by a chat completions API.
//!
//! Sends the query, plus any web search snippets as grounding context, to
//! `POST {endpoint}` and returns the first choice's message content.
//!
//! # Retry Strategy
//!
//! Transient failures are retried with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! When retries run out the last failure is returned as
//! `UpstreamUnavailable`.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GenerativeConfig;
use crate::error::{parse_endpoint, truncate_body, AdapterError, AdapterResult};
use crate::models::{Query, SearchItem};
use crate::traits::AnswerAdapter;

const NAME: &str = "openai";

const SYSTEM_PROMPT: &str = "You are a concise, factual assistant. \
Answer the user's question directly. When web results are provided, \
prefer them as sources; if you do not know the answer, say so.";

pub struct ChatCompletions {
    client: reqwest::Client,
    endpoint: Option<reqwest::Url>,
    api_key_env: String,
    model: String,
    max_tokens: u32,
    max_retries: u32,
}

impl ChatCompletions {
    pub fn new(config: &GenerativeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: parse_endpoint(&config.endpoint),
            api_key_env: config.api_key_env.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
        })
    }

    fn api_key(&self) -> AdapterResult<String> {
        match std::env::var(&self.api_key_env) {
            Ok(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(AdapterError::not_configured(
                NAME,
                format!("{} not set", self.api_key_env),
            )),
        }
    }
}

#[async_trait]
impl AnswerAdapter for ChatCompletions {
    fn name(&self) -> &str {
        NAME
    }

    async fn resolve(&self, query: &Query, prior_context: &[SearchItem]) -> AdapterResult<String> {
        let endpoint = self
            .endpoint
            .clone()
            .ok_or_else(|| AdapterError::not_configured(NAME, "endpoint not set"))?;
        let api_key = self.api_key()?;

        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_user_prompt(query, prior_context) },
            ],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(endpoint.clone())
                .header("Authorization", format!("Bearer {}", api_key))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let text = response
                            .text()
                            .await
                            .map_err(|e| AdapterError::unavailable(NAME, e.to_string()))?;
                        let json: Value = serde_json::from_str(&text).map_err(|e| {
                            AdapterError::protocol(NAME, format!("invalid JSON: {}", e))
                        })?;
                        let answer = parse_chat_response(&json)?;
                        debug!(query = %query, attempt, chars = answer.len(), "generated answer");
                        return Ok(answer);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = AdapterError::unavailable(
                        NAME,
                        format!("HTTP {}: {}", status, truncate_body(body_text.trim(), 200)),
                    );

                    // Rate limited or server error: retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(attempt, status = status.as_u16(), "generative call failed, retrying");
                        last_err = Some(err);
                        continue;
                    }

                    // Client error (not 429): fail now
                    return Err(err);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "generative transport error");
                    last_err = Some(AdapterError::unavailable(NAME, e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| AdapterError::unavailable(NAME, "generation failed after retries")))
    }
}

/// Compose the user message: the question, then numbered web results if any.
pub fn build_user_prompt(query: &Query, prior_context: &[SearchItem]) -> String {
    if prior_context.is_empty() {
        return query.to_string();
    }

    let mut prompt = format!("Question: {}\n\nWeb results:\n", query);
    for (i, item) in prior_context.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {} — {} ({})\n",
            i + 1,
            item.title,
            item.snippet,
            item.link
        ));
    }
    prompt
}

/// Extract `choices[0].message.content` from a chat completion response.
pub fn parse_chat_response(json: &Value) -> AdapterResult<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| AdapterError::protocol(NAME, "missing choices[0].message.content"))?;

    let content = content.trim();
    if content.is_empty() {
        return Err(AdapterError::protocol(NAME, "empty completion"));
    }
    Ok(content.to_string())
}
