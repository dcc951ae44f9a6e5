//! Capability traits for source adapters.
//!
//! The orchestrator only ever talks to these traits, never to a transport.
//! Each upstream provider (local index, web search, generative model) is
//! wrapped in one implementation, and tests substitute in-memory fakes.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────┐
//!  │                  Orchestrator                    │
//!  │                                                  │
//!  │  SearchAdapter      SearchAdapter   AnswerAdapter│
//!  │  (primary index) ─▶ (web search) ─▶ (generative) │
//!  └──────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use query_gateway::error::AdapterResult;
//! use query_gateway::models::{Query, SearchItem};
//! use query_gateway::traits::AnswerAdapter;
//!
//! pub struct EchoModel;
//!
//! #[async_trait]
//! impl AnswerAdapter for EchoModel {
//!     fn name(&self) -> &str { "echo" }
//!
//!     async fn resolve(&self, query: &Query, _ctx: &[SearchItem]) -> AdapterResult<String> {
//!         Ok(format!("You asked: {}", query))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::AdapterResult;
use crate::models::{Query, SearchItem};

/// A source that answers a query with zero or more search items.
///
/// An empty vector is a valid outcome meaning "no match", distinct from a
/// failure.
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    /// Short identifier used in logs (e.g. `"local"`, `"google"`).
    fn name(&self) -> &str;

    async fn resolve(
        &self,
        query: &Query,
        prior_context: &[SearchItem],
    ) -> AdapterResult<Vec<SearchItem>>;
}

/// A source that always produces free text unless the call itself fails.
#[async_trait]
pub trait AnswerAdapter: Send + Sync {
    /// Identifier reported as the `source` of generated answers (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// `prior_context` is typically the (possibly empty) web search result.
    async fn resolve(&self, query: &Query, prior_context: &[SearchItem]) -> AdapterResult<String>;
}
