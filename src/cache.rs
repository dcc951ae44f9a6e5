//! In-memory result cache with LRU eviction and a per-entry TTL.
//!
//! Maps a normalized [`Query`] to the [`Outcome`] that resolved it. The cache
//! is bounded in two ways:
//!
//! - **Size**: at most `max_entries` live entries. Inserting past the bound
//!   evicts the least-recently-used entry (lookups count as use).
//! - **Age**: entries older than `ttl` are treated as absent on lookup and
//!   removed lazily. When the cache is full, expired entries are purged
//!   before any live entry is evicted.
//!
//! All operations take a short `std::sync::Mutex` lock and never await, so a
//! cache call is never a suspension point.
//!
//! # Example
//!
//! ```rust
//! use query_gateway::cache::{CacheSettings, ResultCache};
//! use query_gateway::models::{Outcome, Query};
//!
//! let cache = ResultCache::new(CacheSettings::default());
//! let q = Query::parse("what is rust").unwrap();
//! assert!(cache.lookup(&q).is_none());
//!
//! cache.store(&q, Outcome::Generated { answer_text: "A language.".into() });
//! assert!(cache.lookup(&q).is_some());
//! ```

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::CacheConfig;
use crate::models::{Outcome, Query};

/// Default maximum number of entries.
pub const DEFAULT_MAX_ENTRIES: usize = 500;
/// Default time-to-live per entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Size and age bounds for a [`ResultCache`].
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    pub max_entries: NonZeroUsize,
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: NonZeroUsize::new(DEFAULT_MAX_ENTRIES).unwrap_or(NonZeroUsize::MIN),
            ttl: DEFAULT_TTL,
        }
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            max_entries: NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN),
            ttl: Duration::from_secs(config.ttl_secs),
        }
    }
}

/// Point-in-time counters, exposed on `GET /cache/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub evictions: u64,
}

struct CacheEntry {
    outcome: Outcome,
    created_at: Instant,
}

struct Inner {
    entries: LruCache<Query, CacheEntry>,
    hits: u64,
    misses: u64,
    expired: u64,
    evictions: u64,
}

/// Bounded, time-expiring map from query to outcome.
pub struct ResultCache {
    inner: Mutex<Inner>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(settings.max_entries),
                hits: 0,
                misses: 0,
                expired: 0,
                evictions: 0,
            }),
            ttl: settings.ttl,
        }
    }

    /// Return the stored outcome for `query` if a live entry exists.
    ///
    /// A hit promotes the entry to most-recently-used. An expired entry is
    /// removed and reported as absent.
    pub fn lookup(&self, query: &Query) -> Option<Outcome> {
        self.lookup_at(query, Instant::now())
    }

    /// Insert or fully replace the entry for `query`.
    pub fn store(&self, query: &Query, outcome: Outcome) {
        self.store_at(query, outcome, Instant::now())
    }

    pub(crate) fn lookup_at(&self, query: &Query, now: Instant) -> Option<Outcome> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        match inner.entries.get(query) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(entry) if !is_expired(entry, self.ttl, now) => {
                let outcome = entry.outcome.clone();
                inner.hits += 1;
                return Some(outcome);
            }
            Some(_) => {}
        }

        inner.entries.pop(query);
        inner.expired += 1;
        inner.misses += 1;
        debug!(query = %query, "cache entry expired");
        None
    }

    pub(crate) fn store_at(&self, query: &Query, outcome: Outcome, now: Instant) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let at_capacity = inner.entries.len() >= inner.entries.cap().get();
        if at_capacity && !inner.entries.contains(query) {
            purge_expired(inner, self.ttl, now);
        }

        let entry = CacheEntry {
            outcome,
            created_at: now,
        };
        if let Some((evicted, _)) = inner.entries.push(query.clone(), entry) {
            if &evicted != query {
                inner.evictions += 1;
                debug!(evicted = %evicted, "evicted least-recently-used cache entry");
            }
        }
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            capacity: inner.entries.cap().get(),
            hits: inner.hits,
            misses: inner.misses,
            expired: inner.expired,
            evictions: inner.evictions,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the map half-mutated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

fn is_expired(entry: &CacheEntry, ttl: Duration, now: Instant) -> bool {
    now.saturating_duration_since(entry.created_at) >= ttl
}

fn purge_expired(inner: &mut Inner, ttl: Duration, now: Instant) {
    let stale: Vec<Query> = inner
        .entries
        .iter()
        .filter(|(_, entry)| is_expired(entry, ttl, now))
        .map(|(key, _)| key.clone())
        .collect();

    for key in stale {
        inner.entries.pop(&key);
        inner.expired += 1;
    }
}
