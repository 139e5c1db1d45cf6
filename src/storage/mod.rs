//! Document stores the search layer fetches candidate exercises from.
//!
//! A store answers one question: "give me up to N records of a collection".
//! It never sees query text or filters; ranking happens client-side.
//!
//! - **[`memory`]**: in-process collections.
//! - **[`json`]**: one JSON array file per collection (the format `load` reads).
//! - **[`sqlite`]**: local catalog database.
//! - **[`rest`]**: PostgREST-style HTTP endpoint.

pub mod json;
pub mod memory;
pub mod rest;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Component, Path};
use thiserror::Error;

use crate::model::types::Exercise;

/// Errors a store can report while fetching or writing records.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid collection name: {0:?}")]
    InvalidCollection(String),

    #[error("Unsupported catalog schema version {0}")]
    SchemaVersion(i64),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    /// Fetch up to `limit` records of `collection`, in store order.
    async fn fetch(&self, collection: &str, limit: usize) -> Result<Vec<Exercise>, StoreError>;
}

/// Reject collection names that could escape a directory or URL path segment.
pub fn validate_collection(name: &str) -> Result<(), StoreError> {
    let invalid = name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || Path::new(name)
            .components()
            .any(|c| matches!(c, Component::CurDir | Component::ParentDir));
    if invalid {
        return Err(StoreError::InvalidCollection(name.to_string()));
    }
    Ok(())
}

/// Decode raw documents, skipping any that are not exercise-shaped.
pub(crate) fn decode_records(values: Vec<Value>, backend: &str) -> Vec<Exercise> {
    let mut records = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<Exercise>(value) {
            Ok(record) => records.push(record),
            Err(err) => tracing::warn!(backend = %backend, "skipping malformed exercise document: {err}"),
        }
    }
    records
}
