use std::sync::Arc;
use std::time::Duration;

use exercise_search::model::types::{Exercise, SearchFilters, SearchOptions};
use exercise_search::search::{Debouncer, SearchClient, SearchError};
use exercise_search::storage::StoreError;

mod util;
use util::{CountingStore, FailingStore, sample_catalog};

fn ids(result: &exercise_search::model::types::SearchResult) -> Vec<&str> {
    result.exercises.iter().map(|h| h.exercise.id.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn cached_result_expires_after_ttl() {
    let store = Arc::new(CountingStore::new(sample_catalog()));
    let client = SearchClient::with_store(store.clone());

    client.search(SearchOptions::new("bench")).await;
    assert_eq!(store.fetches(), 1);

    tokio::time::advance(Duration::from_secs(4 * 60 + 59)).await;
    client.search(SearchOptions::new("bench")).await;
    assert_eq!(store.fetches(), 1, "still fresh at 4:59");

    tokio::time::advance(Duration::from_secs(2)).await;
    client.search(SearchOptions::new("bench")).await;
    assert_eq!(store.fetches(), 2, "expired at 5:01");
}

#[tokio::test(start_paused = true)]
async fn repeated_search_is_idempotent() {
    let store = Arc::new(CountingStore::new(sample_catalog()));
    let client = SearchClient::with_store(store.clone());

    let first = client.search(SearchOptions::new("bench").with_scores()).await;
    let second = client.search(SearchOptions::new("bench").with_scores()).await;

    assert_eq!(first, second);
    assert_eq!(ids(&first), vec!["1", "2"]);
    let scores: Vec<_> = first.exercises.iter().map(|h| h.relevance_score).collect();
    assert_eq!(scores, vec![Some(50), Some(25)]);
}

#[tokio::test(start_paused = true)]
async fn normalized_queries_share_cache_entry() {
    let store = Arc::new(CountingStore::new(sample_catalog()));
    let client = SearchClient::with_store(store.clone());

    client.search(SearchOptions::new("bench")).await;
    let result = client.search(SearchOptions::new("  BENCH ")).await;

    assert_eq!(store.fetches(), 1);
    assert_eq!(result.query, "  BENCH ");
    assert_eq!(ids(&result), vec!["1", "2"]);
}

#[tokio::test(start_paused = true)]
async fn cancelled_debounce_never_touches_store() {
    let store = Arc::new(CountingStore::new(sample_catalog()));
    let client = SearchClient::with_store(store.clone());

    let pending = client.debounced_search_after(SearchOptions::new("squat"), Duration::from_millis(300));
    tokio::time::sleep(Duration::from_millis(100)).await;
    pending.cancel();

    let err = pending.wait().await.unwrap_err();
    assert!(matches!(err, SearchError::Cancelled));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropped_pending_search_never_fires() {
    let store = Arc::new(CountingStore::new(sample_catalog()));
    let client = SearchClient::with_store(store.clone());

    drop(client.debounced_search_after(SearchOptions::new("squat"), Duration::from_millis(300)));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn debouncer_handle_keeps_dropped_search_alive() {
    let store = Arc::new(CountingStore::new(sample_catalog()));
    let client = SearchClient::with_store(store.clone());
    let debouncer = Debouncer::with_delay(client.clone(), Duration::from_millis(300));

    drop(debouncer.schedule(SearchOptions::new("squat")));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.fetches(), 1);
    // the fired search populated the cache
    client.search(SearchOptions::new("squat")).await;
    assert_eq!(store.fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn filters_are_exclusive() {
    let store = Arc::new(CountingStore::new(sample_catalog()));
    let client = SearchClient::with_store(store);

    let filters = SearchFilters::default().with_equipment(["dumbbell"]);
    let result = client.search(SearchOptions::new("").with_filters(filters)).await;

    assert_eq!(ids(&result), vec!["2", "7"]);
    assert_eq!(result.total, 2);
    assert!(result.exercises.iter().all(|h| h.relevance_score.is_none()));
}

#[tokio::test(start_paused = true)]
async fn combined_filters_intersect() {
    let store = Arc::new(CountingStore::new(sample_catalog()));
    let client = SearchClient::with_store(store);

    let filters = SearchFilters::default()
        .with_muscles(["chest"])
        .with_difficulty("beginner");
    let result = client.search(SearchOptions::new("").with_filters(filters)).await;

    assert_eq!(ids(&result), vec!["3", "7"]);
}

#[tokio::test(start_paused = true)]
async fn limit_truncates_sorted_results() {
    let records: Vec<Exercise> = (0..50)
        .map(|i| {
            let name = match i % 3 {
                0 => "Press".to_string(),
                1 => format!("Press Variant {i}"),
                _ => format!("Incline Press {i}"),
            };
            Exercise::new(i.to_string(), name)
        })
        .collect();
    let store = Arc::new(CountingStore::new(records));
    let client = SearchClient::with_store(store);

    let result = client
        .search(SearchOptions::new("press").with_limit(5).with_scores())
        .await;

    assert_eq!(result.exercises.len(), 5);
    assert_eq!(result.total, 50);
    let scores: Vec<u32> = result
        .exercises
        .iter()
        .map(|h| h.relevance_score.unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(scores.iter().all(|&s| s == 100));
}

#[tokio::test(start_paused = true)]
async fn store_failure_degrades_to_empty() {
    let client = SearchClient::with_store(Arc::new(FailingStore));

    let result = client.search(SearchOptions::new("bench")).await;
    assert!(result.is_empty());
    assert_eq!(result.total, 0);
    assert_eq!(result.query, "bench");

    let err = client.try_search(SearchOptions::new("bench")).await.unwrap_err();
    assert!(matches!(err, SearchError::Unavailable(_)));
    assert!(!err.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn failures_are_not_cached() {
    let store = Arc::new(CountingStore::new(sample_catalog()));
    store.fail_next(StoreError::UnknownCollection("exercises".into()));
    let client = SearchClient::with_store(store.clone());

    assert!(client.search(SearchOptions::new("squat")).await.is_empty());
    let recovered = client.search(SearchOptions::new("squat")).await;

    assert_eq!(ids(&recovered), vec!["4"]);
    assert_eq!(store.fetches(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_identical_searches_share_one_fetch() {
    let store = Arc::new(CountingStore::new(sample_catalog()).with_latency(Duration::from_millis(50)));
    let client = SearchClient::with_store(store.clone());

    let (a, b) = tokio::join!(
        client.search(SearchOptions::new("plank")),
        client.search(SearchOptions::new("Plank"))
    );

    assert_eq!(store.fetches(), 1);
    assert_eq!(ids(&a), vec!["5"]);
    assert_eq!(ids(&b), vec!["5"]);
}

#[tokio::test(start_paused = true)]
async fn different_limits_are_cached_separately() {
    let store = Arc::new(CountingStore::new(sample_catalog()));
    let client = SearchClient::with_store(store.clone());

    let one = client.search(SearchOptions::new("bench").with_limit(1)).await;
    let two = client.search(SearchOptions::new("bench").with_limit(2)).await;

    assert_eq!(ids(&one), vec!["1"]);
    assert_eq!(ids(&two), vec!["1", "2"]);
    assert_eq!(store.fetches(), 2);
}
