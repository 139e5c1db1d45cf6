//! Search execution: cache lookup, store fetch, filtering, ranking.
//!
//! [`SearchClient`] is built once by the application and shared by cloning.
//! A search is answered from the result cache when a fresh entry exists for
//! its canonical signature; otherwise the client fetches candidates from the
//! store, filters and ranks them locally, and caches the ranked result.
//!
//! Concurrent misses for the same signature share one store fetch.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::Instrument;

use super::cache::{CacheKey, DEFAULT_CACHE_TTL, SearchCache, normalize_query};
use super::filters::matches_filters;
use super::scoring::{ScoringWeights, score_exercise};
use crate::model::types::{Exercise, ScoredExercise, SearchFilters, SearchOptions, SearchResult};
use crate::storage::{DocumentStore, StoreError};

pub const DEFAULT_COLLECTION: &str = "exercises";
pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_FETCH_LIMIT: usize = 100;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Error, Debug, Clone)]
pub enum SearchError {
    /// A debounced search was cancelled before its timer fired.
    #[error("search cancelled before it started")]
    Cancelled,

    /// The document store could not be read.
    #[error("search unavailable: {0}")]
    Unavailable(#[source] Arc<StoreError>),

    #[error("search task failed: {0}")]
    Task(String),
}

impl SearchError {
    /// Cancellations are expected (superseded keystrokes) and safe to ignore.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Tuning knobs for a [`SearchClient`].
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Store collection holding the exercises.
    pub collection: String,
    /// Result limit when a request does not set one.
    pub default_limit: usize,
    /// Minimum number of records requested from the store per miss.
    pub fetch_limit: usize,
    pub cache_ttl: Duration,
    pub debounce: Duration,
    pub weights: ScoringWeights,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            default_limit: DEFAULT_LIMIT,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            cache_ttl: DEFAULT_CACHE_TTL,
            debounce: DEFAULT_DEBOUNCE,
            weights: ScoringWeights::default(),
        }
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<SearchResult, Arc<StoreError>>>>;

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

struct ClientInner {
    store: Arc<dyn DocumentStore>,
    settings: SearchSettings,
    cache: SearchCache,
    in_flight: Mutex<HashMap<CacheKey, InFlight>>,
    next_flight: AtomicU64,
}

#[derive(Clone)]
pub struct SearchClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("backend", &self.inner.store.backend())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl SearchClient {
    pub fn new(store: Arc<dyn DocumentStore>, settings: SearchSettings) -> Self {
        let cache = SearchCache::new(settings.cache_ttl);
        Self {
            inner: Arc::new(ClientInner {
                store,
                settings,
                cache,
                in_flight: Mutex::new(HashMap::new()),
                next_flight: AtomicU64::new(0),
            }),
        }
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, SearchSettings::default())
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.inner.settings
    }

    pub fn cache(&self) -> &SearchCache {
        &self.inner.cache
    }

    /// Empty the result cache. Safe to call repeatedly.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        tracing::debug!("search cache cleared");
    }

    /// Run a search, degrading to an empty result if the store cannot be read.
    ///
    /// Use [`SearchClient::try_search`] to tell "nothing matched" apart from
    /// "the store is down".
    pub async fn search(&self, options: SearchOptions) -> SearchResult {
        match self.try_search(options.clone()).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(query = %options.query, "search failed, returning no results: {err}");
                SearchResult::empty(options.query, options.filters)
            }
        }
    }

    /// Run a search, surfacing store failures as [`SearchError::Unavailable`].
    pub async fn try_search(&self, options: SearchOptions) -> Result<SearchResult, SearchError> {
        let limit = options.limit.unwrap_or(self.inner.settings.default_limit);
        let key = CacheKey::new(&options.query, &options.filters, limit);
        let span = tracing::info_span!("search", query = %key.query(), limit);

        async move {
            tracing::info!(backend = %self.inner.store.backend(), "search_start");

            if let Some(cached) = self.inner.cache.get(&key) {
                tracing::info!(cache = %"hit", matched = cached.total, "search_complete");
                return Ok(present(cached, &options));
            }

            let (id, fetch) = match self.join_or_start_fetch(&key, &options, limit) {
                Flight::Done(cached) => {
                    tracing::info!(cache = %"hit", matched = cached.total, "search_complete");
                    return Ok(present(cached, &options));
                }
                Flight::Pending { id, fetch } => (id, fetch),
            };

            // Removes the in-flight entry even if this caller is dropped mid-await.
            let guard = FlightGuard {
                inner: &self.inner,
                key: &key,
                id,
            };
            let result = fetch.await.map_err(SearchError::Unavailable)?;
            self.inner.cache.insert(key.clone(), result.clone());
            drop(guard);

            tracing::info!(cache = %"miss", matched = result.total, "search_complete");
            Ok(present(result, &options))
        }
        .instrument(span)
        .await
    }

    /// Join the flight already fetching `key`, start a new one, or return a
    /// result another flight cached since the caller's lookup.
    fn join_or_start_fetch(&self, key: &CacheKey, options: &SearchOptions, limit: usize) -> Flight {
        let mut in_flight = self.inner.in_flight.lock();
        if let Some(flight) = in_flight.get(key) {
            tracing::debug!("joining in-flight fetch");
            return Flight::Pending {
                id: flight.id,
                fetch: flight.fetch.clone(),
            };
        }
        if let Some(cached) = self.inner.cache.get(key) {
            return Flight::Done(cached);
        }

        let id = self.inner.next_flight.fetch_add(1, Ordering::Relaxed);
        let store = Arc::clone(&self.inner.store);
        let collection = self.inner.settings.collection.clone();
        let fetch_limit = limit.max(self.inner.settings.fetch_limit);
        let weights = self.inner.settings.weights;
        let query = options.query.clone();
        let filters = options.filters.clone();

        let fetch = async move {
            let records = store
                .fetch(&collection, fetch_limit)
                .await
                .map_err(Arc::new)?;
            tracing::debug!(fetched = records.len(), backend = store.backend(), "store fetch");
            Ok::<_, Arc<StoreError>>(rank_exercises(records, &query, &filters, limit, &weights))
        }
        .boxed()
        .shared();

        in_flight.insert(
            key.clone(),
            InFlight {
                id,
                fetch: fetch.clone(),
            },
        );
        Flight::Pending { id, fetch }
    }
}

enum Flight {
    Done(SearchResult),
    Pending { id: u64, fetch: SharedFetch },
}

struct FlightGuard<'a> {
    inner: &'a ClientInner,
    key: &'a CacheKey,
    id: u64,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.inner.in_flight.lock();
        if in_flight.get(self.key).is_some_and(|flight| flight.id == self.id) {
            in_flight.remove(self.key);
        }
    }
}

/// Shape a (possibly cached) ranked result for one caller.
fn present(mut result: SearchResult, options: &SearchOptions) -> SearchResult {
    result.query = options.query.clone();
    result.filters = options.filters.clone();
    if options.include_score {
        result
    } else {
        result.without_scores()
    }
}

/// Filter, score, order and truncate `records` for one request.
///
/// With a non-blank query every surviving record is scored, zero scores are
/// dropped and the rest sorted by descending score (ties keep store order).
/// A blank query keeps store order and attaches no scores. `total` counts
/// matches before truncation.
pub fn rank_exercises(
    records: Vec<Exercise>,
    query: &str,
    filters: &SearchFilters,
    limit: usize,
    weights: &ScoringWeights,
) -> SearchResult {
    let normalized = normalize_query(query);
    let filtered = records.into_iter().filter(|r| matches_filters(r, filters));

    let mut hits: Vec<ScoredExercise> = if normalized.is_empty() {
        filtered
            .map(|exercise| ScoredExercise {
                exercise,
                relevance_score: None,
            })
            .collect()
    } else {
        let mut scored: Vec<ScoredExercise> = filtered
            .filter_map(|exercise| {
                let score = score_exercise(&exercise, &normalized, filters, weights);
                (score > 0).then_some(ScoredExercise {
                    exercise,
                    relevance_score: Some(score),
                })
            })
            .collect();
        scored.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        scored
    };

    let total = hits.len();
    hits.truncate(limit);

    SearchResult {
        exercises: hits,
        total,
        query: query.to_string(),
        filters: filters.clone(),
    }
}
