use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use exercise_search::model::types::{Equipment, Exercise};
use exercise_search::storage::{DocumentStore, StoreError};
use parking_lot::Mutex;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }
}

#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    prev: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn set(key: &str, val: impl AsRef<str>) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::set_var(key, val.as_ref()) };
        Self {
            key: key.to_string(),
            prev,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => unsafe { std::env::set_var(&self.key, v) },
            None => unsafe { std::env::remove_var(&self.key) },
        }
    }
}

struct TestWriter(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Store that serves a fixed catalog and counts fetches.
///
/// Optional `latency` keeps a fetch pending so tests can overlap callers;
/// queued failures are returned (in order) before the catalog is served.
#[allow(dead_code)]
pub struct CountingStore {
    records: Vec<Exercise>,
    fetches: AtomicUsize,
    latency: Option<Duration>,
    failures: Mutex<VecDeque<StoreError>>,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn new(records: Vec<Exercise>) -> Self {
        Self {
            records,
            fetches: AtomicUsize::new(0),
            latency: None,
            failures: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn fail_next(&self, err: StoreError) {
        self.failures.lock().push_back(err);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    fn backend(&self) -> &'static str {
        "counting"
    }

    async fn fetch(&self, _collection: &str, limit: usize) -> Result<Vec<Exercise>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }
        Ok(self.records.iter().take(limit).cloned().collect())
    }
}

/// Store that is always down.
#[allow(dead_code)]
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn fetch(&self, _collection: &str, _limit: usize) -> Result<Vec<Exercise>, StoreError> {
        Err(StoreError::Status {
            status: 503,
            body: "service unavailable".into(),
        })
    }
}

#[allow(dead_code)]
pub fn exercise(
    id: &str,
    name: &str,
    category: &str,
    equipment: &str,
    muscles: &[&str],
    difficulty: &str,
) -> Exercise {
    let mut ex = Exercise::new(id, name);
    ex.category = Some(category.into());
    ex.equipment = Some(Equipment::One(equipment.into()));
    ex.primary_muscles = muscles.iter().map(|m| m.to_string()).collect();
    ex.difficulty = Some(difficulty.into());
    ex
}

/// Small mixed catalog used across integration tests.
#[allow(dead_code)]
pub fn sample_catalog() -> Vec<Exercise> {
    vec![
        exercise("1", "Bench Press", "strength", "barbell", &["chest"], "intermediate"),
        exercise("2", "Incline Bench Press", "strength", "dumbbell", &["chest"], "intermediate"),
        exercise("3", "Push Up", "strength", "body only", &["chest", "triceps"], "beginner"),
        exercise("4", "Squat", "strength", "barbell", &["quadriceps"], "intermediate"),
        exercise("5", "Plank", "core", "body only", &["abdominals"], "beginner"),
        exercise("6", "Treadmill Run", "cardio", "machine", &["quadriceps"], "beginner"),
        exercise("7", "Dumbbell Fly", "strength", "dumbbell", &["chest"], "beginner"),
    ]
}
