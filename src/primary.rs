//! Primary index adapters.
//!
//! The primary index is the first and cheapest source in the chain. Two
//! implementations ship with the gateway:
//!
//! - **[`EmptyIndex`]**: never matches; used when no index is configured so
//!   every query falls through to web search.
//! - **[`LocalIndex`]**: a small in-memory index loaded from a TOML file.
//!
//! # Index File Format
//!
//! ```toml
//! [[entries]]
//! title = "Office hours"
//! snippet = "The office is open 9:00-17:00 on weekdays."
//! link = "https://intranet.example.org/hours"
//! keywords = ["opening", "times"]
//! ```
//!
//! # Matching
//!
//! An entry matches when every whitespace-separated query term appears,
//! case-insensitively, in its title, snippet, or keywords. Matches keep file
//! order and are truncated to `max_results`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

use crate::config::PrimaryConfig;
use crate::error::AdapterResult;
use crate::models::{Query, SearchItem, SourceTag};
use crate::traits::SearchAdapter;

/// A primary index with no entries.
pub struct EmptyIndex;

#[async_trait]
impl SearchAdapter for EmptyIndex {
    fn name(&self) -> &str {
        "empty"
    }

    async fn resolve(&self, _query: &Query, _ctx: &[SearchItem]) -> AdapterResult<Vec<SearchItem>> {
        Ok(Vec::new())
    }
}

/// One document in a [`LocalIndex`].
#[derive(Debug, Clone, Deserialize)]
pub struct IndexEntry {
    pub title: String,
    pub snippet: String,
    pub link: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    entries: Vec<IndexEntry>,
}

struct IndexedEntry {
    entry: IndexEntry,
    haystack: String,
}

/// In-memory keyword index.
pub struct LocalIndex {
    entries: Vec<IndexedEntry>,
    max_results: usize,
}

impl LocalIndex {
    pub fn new(entries: Vec<IndexEntry>, max_results: usize) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let haystack = format!(
                    "{} {} {}",
                    entry.title,
                    entry.snippet,
                    entry.keywords.join(" ")
                )
                .to_lowercase();
                IndexedEntry { entry, haystack }
            })
            .collect();
        Self {
            entries,
            max_results,
        }
    }

    /// Load entries from a TOML index file.
    pub fn load(path: &Path, max_results: usize) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read index file: {}", path.display()))?;
        let file: IndexFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse index file: {}", path.display()))?;
        Ok(Self::new(file.entries, max_results))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matches(&self, query: &Query) -> Vec<SearchItem> {
        let terms: Vec<String> = query
            .as_str()
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();

        self.entries
            .iter()
            .filter(|e| terms.iter().all(|t| e.haystack.contains(t.as_str())))
            .take(self.max_results)
            .map(|e| SearchItem {
                title: e.entry.title.clone(),
                snippet: e.entry.snippet.clone(),
                link: e.entry.link.clone(),
                source: SourceTag::Primary,
            })
            .collect()
    }
}

#[async_trait]
impl SearchAdapter for LocalIndex {
    fn name(&self) -> &str {
        "local"
    }

    async fn resolve(&self, query: &Query, _ctx: &[SearchItem]) -> AdapterResult<Vec<SearchItem>> {
        Ok(self.matches(query))
    }
}

/// Build the primary adapter described by `config`.
pub fn create_primary(config: &PrimaryConfig) -> Result<Box<dyn SearchAdapter>> {
    match &config.index_path {
        Some(path) => {
            let index = LocalIndex::load(path, config.max_results)?;
            tracing::info!(path = %path.display(), entries = index.len(), "loaded primary index");
            Ok(Box::new(index))
        }
        None => Ok(Box::new(EmptyIndex)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(title: &str, snippet: &str, keywords: &[&str]) -> IndexEntry {
        IndexEntry {
            title: title.to_string(),
            snippet: snippet.to_string(),
            link: format!("https://intranet.example.org/{}", title.to_lowercase()),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn q(s: &str) -> Query {
        Query::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_empty_index_returns_no_items() {
        let items = EmptyIndex.resolve(&q("anything"), &[]).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_all_terms_must_match() {
        let index = LocalIndex::new(
            vec![
                entry("Hours", "The office is open on weekdays.", &["opening"]),
                entry("Parking", "Visitor parking is behind the office.", &[]),
            ],
            5,
        );

        let items = index.resolve(&q("OFFICE opening"), &[]).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Hours");
        assert_eq!(items[0].source, SourceTag::Primary);

        let items = index.resolve(&q("office"), &[]).await.unwrap();
        assert_eq!(items.len(), 2);

        let items = index.resolve(&q("capital of France"), &[]).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_truncates_to_max_results() {
        let entries = (0..10)
            .map(|i| entry(&format!("Doc{}", i), "shared text", &[]))
            .collect();
        let index = LocalIndex::new(entries, 3);
        let items = index.resolve(&q("shared"), &[]).await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Doc0");
    }

    #[test]
    fn test_load_index_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[entries]]
title = "Hours"
snippet = "Open weekdays."
link = "https://intranet.example.org/hours"
keywords = ["opening"]

[[entries]]
title = "Parking"
snippet = "Behind the building."
link = "https://intranet.example.org/parking"
"#
        )
        .unwrap();

        let index = LocalIndex::load(file.path(), 5).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_create_primary_without_path_is_empty() {
        let adapter = create_primary(&PrimaryConfig::default()).unwrap();
        assert_eq!(adapter.name(), "empty");
    }
}
