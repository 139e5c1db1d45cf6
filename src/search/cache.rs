//! In-process TTL cache of search results.
//!
//! Entries are keyed by the canonical `(query, filters, limit)` signature and
//! live for `ttl` from the moment they were produced. Stale entries are only
//! dropped when a lookup trips over them; nothing sweeps in the background.
//!
//! Time is read from `tokio::time::Instant` so a paused test clock drives expiry.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::model::types::{SearchFilters, SearchResult};

/// Default lifetime of a cached result (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Trim and lower-case a query the same way scoring sees it.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Canonical signature of a search request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    filters: SearchFilters,
    limit: usize,
}

impl CacheKey {
    pub fn new(query: &str, filters: &SearchFilters, limit: usize) -> Self {
        Self {
            query: normalize_query(query),
            filters: filters.canonical(),
            limit,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: SearchResult,
    cached_at: Instant,
}

#[derive(Debug)]
pub struct SearchCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached result for `key`, purging the entry if it has expired.
    pub fn get(&self, key: &CacheKey) -> Option<SearchResult> {
        let mut entries = self.entries.lock();
        let fresh = entries
            .get(key)
            .map(|entry| entry.cached_at.elapsed() < self.ttl)?;

        if fresh {
            entries.get(key).map(|entry| entry.result.clone())
        } else {
            entries.remove(key);
            tracing::debug!(query = key.query(), "search cache entry expired");
            None
        }
    }

    pub fn insert(&self, key: CacheKey, result: SearchResult) {
        self.entries.lock().insert(
            key,
            CacheEntry {
                result,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop every entry, fresh or not.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, including stale ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(query: &str) -> CacheKey {
        CacheKey::new(query, &SearchFilters::default(), 10)
    }

    fn result(query: &str) -> SearchResult {
        SearchResult::empty(query, SearchFilters::default())
    }

    #[test]
    fn key_is_canonical() {
        let a = CacheKey::new(
            "  Bench ",
            &SearchFilters::default().with_equipment(["barbell", "bench"]),
            5,
        );
        let b = CacheKey::new(
            "bench",
            &SearchFilters::default().with_equipment(["bench", "barbell"]),
            5,
        );
        assert_eq!(a, b);
        assert_ne!(a, CacheKey::new("bench", &SearchFilters::default(), 5));
        assert_ne!(b, CacheKey::new("bench", &b.filters, 6));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = SearchCache::default();
        cache.insert(key("row"), result("row"));

        tokio::time::advance(Duration::from_secs(4 * 60 + 59)).await;
        assert!(cache.get(&key("row")).is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get(&key("row")).is_none());
        assert!(cache.is_empty(), "stale entry is purged on lookup");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_linger_until_looked_up() {
        let cache = SearchCache::new(Duration::from_secs(1));
        cache.insert(key("a"), result("a"));
        cache.insert(key("b"), result("b"));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("a")).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_is_idempotent() {
        let cache = SearchCache::default();
        cache.insert(key("dip"), result("dip"));
        cache.clear();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&key("dip")).is_none());
    }
}
