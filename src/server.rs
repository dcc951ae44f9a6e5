//! HTTP gateway.
//!
//! A thin axum adapter over the [`Orchestrator`]: it validates input,
//! invokes the orchestrator, and serializes the outcome.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/search?q=<text>` | Resolve through the fallback chain |
//! | `POST` | `/ai` | Ask the generative model directly (`{"prompt": "..."}`) |
//! | `GET`  | `/health` | Liveness check, no dependency checks |
//! | `GET`  | `/cache/stats` | Result cache counters |
//!
//! # Response Shapes
//!
//! ```json
//! { "source": "web", "results": [{ "title": "...", "snippet": "...", "link": "...", "source": "web" }] }
//! { "source": "openai", "answer": "...", "cached": true }
//! { "assistant": "I", "reply": "..." }
//! { "error": "q must not be empty" }
//! ```
//!
//! `cached` is present (and `true`) only when the outcome came from the cache.
//! Absorbed source failures are never visible to callers; only a terminal
//! failure surfaces, as a 500.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{Query as QueryParams, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::cache::{CacheStats, ResultCache};
use crate::config::Config;
use crate::generative::ChatCompletions;
use crate::models::{Outcome, Query, Resolution, SearchItem};
use crate::orchestrator::Orchestrator;
use crate::primary::create_primary;
use crate::web::WebSearch;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
}

/// Build the orchestrator and its adapters from configuration.
pub fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let cache = Arc::new(ResultCache::new((&config.cache).into()));
    let primary = create_primary(&config.primary).context("Failed to build primary index")?;
    let web = WebSearch::new(&config.web).context("Failed to build web search client")?;
    let generative =
        ChatCompletions::new(&config.generative).context("Failed to build generative client")?;

    Ok(Orchestrator::new(
        cache,
        primary,
        Box::new(web),
        Box::new(generative),
    ))
}

/// Starts the HTTP gateway on `[server].bind` and serves until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let orchestrator = Arc::new(build_orchestrator(config)?);
    serve(&config.server.bind, orchestrator).await
}

/// Serve an already-built orchestrator. Used by [`run_server`] and by tests
/// that inject their own adapters.
pub async fn serve(bind: &str, orchestrator: Arc<Orchestrator>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!(bind = %bind, "gateway listening");

    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

/// Route table with CORS applied.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(handle_search))
        .route("/ai", post(handle_ai))
        .route("/health", get(handle_health))
        .route("/cache/stats", get(handle_cache_stats))
        .layer(cors)
        .with_state(AppState { orchestrator })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

// ============ GET /search ============

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

/// JSON body for `GET /search`; exactly one of `results`/`answer` is set.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SearchItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

impl SearchResponse {
    /// Shape a resolution for the wire. `generative_name` labels generated answers.
    pub fn from_resolution(resolution: Resolution, generative_name: &str) -> Self {
        let cached = resolution.cached;
        match resolution.outcome {
            Outcome::Primary { items } => Self {
                source: "primary".to_string(),
                results: Some(items),
                answer: None,
                cached,
            },
            Outcome::Web { items } => Self {
                source: "web".to_string(),
                results: Some(items),
                answer: None,
                cached,
            },
            Outcome::Generated { answer_text } => Self {
                source: generative_name.to_string(),
                results: None,
                answer: Some(answer_text),
                cached,
            },
        }
    }
}

async fn handle_search(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params
        .q
        .as_deref()
        .and_then(Query::parse)
        .ok_or_else(|| bad_request("q must not be empty"))?;

    let resolution = state
        .orchestrator
        .resolve(&query)
        .await
        .map_err(|e| internal(e.to_string()))?;

    Ok(Json(SearchResponse::from_resolution(
        resolution,
        state.orchestrator.generative_name(),
    )))
}

// ============ POST /ai ============

#[derive(Deserialize)]
struct AiRequest {
    prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AiResponse {
    pub assistant: String,
    pub reply: String,
}

async fn handle_ai(State(state): State<AppState>, body: Bytes) -> Result<Json<AiResponse>, AppError> {
    let request: AiRequest = serde_json::from_slice(&body)
        .map_err(|e| bad_request(format!("invalid JSON body: {}", e)))?;

    let prompt = request
        .prompt
        .as_deref()
        .and_then(Query::parse)
        .ok_or_else(|| bad_request("prompt must not be empty"))?;

    let reply = state.orchestrator.ask(&prompt).await.map_err(|e| {
        warn!(kind = e.kind(), error = %e, "direct generative call failed");
        internal(e.to_string())
    })?;

    Ok(Json(AiResponse {
        assistant: "I".to_string(),
        reply,
    }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    /// Milliseconds since the Unix epoch.
    ts: i64,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        ts: chrono::Utc::now().timestamp_millis(),
    })
}

// ============ GET /cache/stats ============

async fn handle_cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.orchestrator.cache().stats())
}
