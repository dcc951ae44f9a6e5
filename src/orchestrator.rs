//! Fallback orchestrator: resolves a query through the ordered source chain.
//!
//! # Algorithm
//!
//! 1. Look up the cache. A live entry is returned as-is (`cached = true`).
//! 2. Primary index. A non-empty result short-circuits as `Outcome::Primary`.
//! 3. Web search. A non-empty result short-circuits as `Outcome::Web`.
//!    A failure is absorbed (logged, never propagated) and leaves the
//!    generative step with an empty context.
//! 4. Generative answer, given the web items (possibly empty) as context.
//!    Success yields `Outcome::Generated`; failure is terminal and surfaces
//!    as [`ResolveError::AllSourcesExhausted`].
//!
//! Every successful outcome is stored in the cache; a terminal failure stores
//! nothing. Steps run strictly in order, each awaited before the next starts,
//! and no step is retried here (retries belong to the adapter's transport).
//!
//! Concurrent resolutions of the same uncached query are not coalesced: each
//! walks the chain on its own and the last one to finish wins the cache slot.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cache::ResultCache;
use crate::error::{AdapterError, ResolveError};
use crate::models::{Outcome, Query, Resolution, SearchItem};
use crate::traits::{AnswerAdapter, SearchAdapter};

/// Progress of a single resolution, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    TriedPrimary,
    TriedWeb,
    TriedGenerative,
    Resolved,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::NotStarted => "not_started",
            Stage::TriedPrimary => "tried_primary",
            Stage::TriedWeb => "tried_web",
            Stage::TriedGenerative => "tried_generative",
            Stage::Resolved => "resolved",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}

pub struct Orchestrator {
    cache: Arc<ResultCache>,
    primary: Box<dyn SearchAdapter>,
    web: Box<dyn SearchAdapter>,
    generative: Box<dyn AnswerAdapter>,
}

impl Orchestrator {
    pub fn new(
        cache: Arc<ResultCache>,
        primary: Box<dyn SearchAdapter>,
        web: Box<dyn SearchAdapter>,
        generative: Box<dyn AnswerAdapter>,
    ) -> Self {
        Self {
            cache,
            primary,
            web,
            generative,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Name reported as the `source` of generated answers.
    pub fn generative_name(&self) -> &str {
        self.generative.name()
    }

    /// Resolve `query` through cache, primary, web, then generative.
    pub async fn resolve(&self, query: &Query) -> Result<Resolution, ResolveError> {
        let mut stage;

        if let Some(outcome) = self.cache.lookup(query) {
            debug!(query = %query, stage = %Stage::NotStarted, outcome = outcome.label(), "cache hit");
            return Ok(Resolution {
                outcome,
                cached: true,
            });
        }

        stage = Stage::TriedPrimary;
        let primary_items = self
            .primary
            .resolve(query, &[])
            .await
            .unwrap_or_else(|e| {
                absorb(query, stage, self.primary.name(), &e);
                Vec::new()
            });

        if !primary_items.is_empty() {
            return Ok(self.finish(
                query,
                stage,
                Outcome::Primary {
                    items: primary_items,
                },
            ));
        }

        stage = Stage::TriedWeb;
        let context = match self.web.resolve(query, &[]).await {
            Ok(items) => items,
            Err(e) => {
                absorb(query, stage, self.web.name(), &e);
                Vec::new()
            }
        };

        if !context.is_empty() {
            return Ok(self.finish(query, stage, Outcome::Web { items: context }));
        }

        stage = Stage::TriedGenerative;
        let answer = self.generative.resolve(query, &context).await;

        match answer {
            Ok(answer_text) => Ok(self.finish(query, stage, Outcome::Generated { answer_text })),
            Err(e) => {
                error!(
                    query = %query,
                    stage = %Stage::Failed,
                    adapter = self.generative.name(),
                    kind = e.kind(),
                    error = %e,
                    "all sources exhausted"
                );
                Err(ResolveError::AllSourcesExhausted { source: e })
            }
        }
    }

    /// Call the generative adapter directly with no context, bypassing the
    /// chain and the cache.
    pub async fn ask(&self, prompt: &Query) -> Result<String, AdapterError> {
        let no_context: &[SearchItem] = &[];
        self.generative.resolve(prompt, no_context).await
    }

    fn finish(&self, query: &Query, after: Stage, outcome: Outcome) -> Resolution {
        info!(
            query = %query,
            after = %after,
            stage = %Stage::Resolved,
            outcome = outcome.label(),
            "query resolved"
        );
        self.cache.store(query, outcome.clone());
        Resolution {
            outcome,
            cached: false,
        }
    }
}

fn absorb(query: &Query, stage: Stage, adapter: &str, err: &AdapterError) {
    warn!(
        query = %query,
        stage = %stage,
        adapter,
        kind = err.kind(),
        error = %err,
        "source failed, falling back"
    );
}
