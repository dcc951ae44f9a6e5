//! Core data models used throughout the gateway.
//!
//! These types represent the queries, search items, and outcomes that flow
//! through the fallback pipeline and the result cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized user query.
///
/// Normalization is limited to trimming surrounding whitespace. Case and
/// punctuation are preserved, so `"Rust"` and `"rust?"` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    /// Trim `raw` and wrap it, or return `None` if nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which search source produced a [`SearchItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Primary,
    Web,
}

/// A single search hit from the primary index or web search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub source: SourceTag,
}

/// The result of resolving a query. The variant records which source
/// satisfied the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Primary { items: Vec<SearchItem> },
    Web { items: Vec<SearchItem> },
    Generated { answer_text: String },
}

impl Outcome {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Primary { .. } => "primary",
            Outcome::Web { .. } => "web",
            Outcome::Generated { .. } => "generated",
        }
    }
}

/// An outcome plus whether it was served from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub cached: bool,
}
