use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{DocumentStore, StoreError};
use crate::model::types::Exercise;

/// Collections held in memory. A collection that was never inserted reads as empty.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Exercise>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(self, collection: impl Into<String>, records: Vec<Exercise>) -> Self {
        self.insert(collection, records);
        self
    }

    /// Append records to a collection.
    pub fn insert(&self, collection: impl Into<String>, records: Vec<Exercise>) {
        self.collections
            .write()
            .entry(collection.into())
            .or_default()
            .extend(records);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, collection: &str, limit: usize) -> Result<Vec<Exercise>, StoreError> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|records| records.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
