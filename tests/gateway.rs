//! End-to-end tests of the HTTP gateway with in-memory source adapters.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use query_gateway::cache::{CacheSettings, ResultCache};
use query_gateway::error::{AdapterError, AdapterResult};
use query_gateway::models::{Query, SearchItem, SourceTag};
use query_gateway::orchestrator::Orchestrator;
use query_gateway::server;
use query_gateway::traits::{AnswerAdapter, SearchAdapter};

// ─── Fakes ──────────────────────────────────────────────────────────

/// Answers only the queries it knows, counting every call.
struct ScriptedSearch {
    name: &'static str,
    hits: Vec<(&'static str, Vec<SearchItem>)>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SearchAdapter for ScriptedSearch {
    fn name(&self) -> &str {
        self.name
    }

    async fn resolve(&self, query: &Query, _ctx: &[SearchItem]) -> AdapterResult<Vec<SearchItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AdapterError::not_configured(self.name, "GOOGLE_API_KEY not set"));
        }
        Ok(self
            .hits
            .iter()
            .find(|(q, _)| *q == query.as_str())
            .map(|(_, items)| items.clone())
            .unwrap_or_default())
    }
}

struct ScriptedModel {
    fail: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AnswerAdapter for ScriptedModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn resolve(&self, query: &Query, ctx: &[SearchItem]) -> AdapterResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AdapterError::unavailable("openai", "HTTP 503: overloaded"));
        }
        if query.as_str() == "xyz123nonsense" {
            return Ok("I don't have information on that.".to_string());
        }
        Ok(format!("answer to '{}' with {} context items", query, ctx.len()))
    }
}

struct Counters {
    primary: Arc<AtomicUsize>,
    web: Arc<AtomicUsize>,
    model: Arc<AtomicUsize>,
}

fn paris() -> SearchItem {
    SearchItem {
        title: "Paris".into(),
        snippet: "Paris is the capital and most populous city of France.".into(),
        link: "https://en.wikipedia.org/wiki/Paris".into(),
        source: SourceTag::Web,
    }
}

fn office_hours() -> SearchItem {
    SearchItem {
        title: "Office hours".into(),
        snippet: "Open weekdays 9:00-17:00.".into(),
        link: "https://intranet.example.org/hours".into(),
        source: SourceTag::Primary,
    }
}

fn build(web_fails: bool, model_fails: bool) -> (Arc<Orchestrator>, Counters) {
    let counters = Counters {
        primary: Arc::new(AtomicUsize::new(0)),
        web: Arc::new(AtomicUsize::new(0)),
        model: Arc::new(AtomicUsize::new(0)),
    };
    let orchestrator = Orchestrator::new(
        Arc::new(ResultCache::new(CacheSettings::default())),
        Box::new(ScriptedSearch {
            name: "local",
            hits: vec![("office hours", vec![office_hours()])],
            fail: false,
            calls: counters.primary.clone(),
        }),
        Box::new(ScriptedSearch {
            name: "google",
            hits: vec![("capital of France", vec![paris()])],
            fail: web_fails,
            calls: counters.web.clone(),
        }),
        Box::new(ScriptedModel {
            fail: model_fails,
            calls: counters.model.clone(),
        }),
    );
    (Arc::new(orchestrator), counters)
}

// ─── Helpers ────────────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn start(orchestrator: Arc<Orchestrator>) -> String {
    let port = find_free_port();
    let bind = format!("127.0.0.1:{}", port);
    tokio::spawn(async move {
        server::serve(&bind, orchestrator).await.unwrap();
    });
    wait_for_server(port).await;
    format!("http://127.0.0.1:{}", port)
}

async fn get_json(url: &str) -> (u16, Value) {
    let resp = reqwest::get(url).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let (orchestrator, _) = build(false, false);
    let base = start(orchestrator).await;

    let (status, body) = get_json(&format!("{}/health", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert!(body["ts"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_search_primary_short_circuits() {
    let (orchestrator, counters) = build(false, false);
    let base = start(orchestrator).await;

    let (status, body) = get_json(&format!("{}/search?q=office%20hours", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["source"], "primary");
    assert_eq!(body["results"][0]["title"], "Office hours");
    assert_eq!(counters.web.load(Ordering::SeqCst), 0);
    assert_eq!(counters.model.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_web_then_cached() {
    let (orchestrator, counters) = build(false, false);
    let base = start(orchestrator).await;
    let url = format!("{}/search?q=capital%20of%20France", base);

    let (status, first) = get_json(&url).await;
    assert_eq!(status, 200);
    assert_eq!(first["source"], "web");
    assert_eq!(first["results"].as_array().unwrap().len(), 1);
    assert_eq!(first["results"][0]["title"], "Paris");
    assert_eq!(first["results"][0]["source"], "web");
    assert!(first.get("cached").is_none());

    let (status, second) = get_json(&url).await;
    assert_eq!(status, 200);
    assert_eq!(second["cached"], true);
    assert_eq!(second["results"], first["results"]);
    assert_eq!(counters.web.load(Ordering::SeqCst), 1);

    let (_, stats) = get_json(&format!("{}/cache/stats", base)).await;
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["entries"], 1);
}

#[tokio::test]
async fn test_search_generative_fallback() {
    let (orchestrator, _) = build(false, false);
    let base = start(orchestrator).await;

    let (status, body) = get_json(&format!("{}/search?q=xyz123nonsense", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["source"], "openai");
    assert_eq!(body["answer"], "I don't have information on that.");
}

#[tokio::test]
async fn test_search_absorbs_web_failure() {
    let (orchestrator, counters) = build(true, false);
    let base = start(orchestrator).await;

    let (status, body) = get_json(&format!("{}/search?q=capital%20of%20France", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["source"], "openai");
    assert_eq!(
        body["answer"],
        "answer to 'capital of France' with 0 context items"
    );
    assert_eq!(counters.web.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_search_terminal_failure_is_500() {
    let (orchestrator, _) = build(true, true);
    let base = start(orchestrator).await;

    let (status, body) = get_json(&format!("{}/search?q=anything", base)).await;
    assert_eq!(status, 500);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("all sources exhausted"));
    // The absorbed web failure is not exposed.
    assert!(!message.contains("GOOGLE_API_KEY"));

    let (_, stats) = get_json(&format!("{}/cache/stats", base)).await;
    assert_eq!(stats["entries"], 0);
}

#[tokio::test]
async fn test_search_rejects_missing_or_blank_query() {
    let (orchestrator, counters) = build(false, false);
    let base = start(orchestrator).await;

    let (status, body) = get_json(&format!("{}/search", base)).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().is_some());

    let (status, _) = get_json(&format!("{}/search?q=%20%20", base)).await;
    assert_eq!(status, 400);
    assert_eq!(counters.primary.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ai_direct() {
    let (orchestrator, counters) = build(false, false);
    let base = start(orchestrator).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ai", base))
        .json(&json!({ "prompt": "say hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["assistant"], "I");
    assert_eq!(body["reply"], "answer to 'say hi' with 0 context items");
    assert_eq!(counters.primary.load(Ordering::SeqCst), 0);
    assert_eq!(counters.web.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ai_rejects_missing_prompt() {
    let (orchestrator, counters) = build(false, false);
    let base = start(orchestrator).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ai", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = client
        .post(format!("{}/ai", base))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(counters.model.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ai_failure_is_500() {
    let (orchestrator, _) = build(false, true);
    let base = start(orchestrator).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ai", base))
        .json(&json!({ "prompt": "say hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("503"));
}
