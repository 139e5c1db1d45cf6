//! Catalog stored as `<dir>/<collection>.json`, each file a JSON array of exercises.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::{DocumentStore, StoreError, decode_records, validate_collection};
use crate::model::types::Exercise;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn collection_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        validate_collection(collection)?;
        Ok(self.dir.join(format!("{collection}.json")))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    fn backend(&self) -> &'static str {
        "json"
    }

    async fn fetch(&self, collection: &str, limit: usize) -> Result<Vec<Exercise>, StoreError> {
        let path = self.collection_path(collection)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::UnknownCollection(collection.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let mut values: Vec<Value> = serde_json::from_str(&content)?;
        values.truncate(limit);
        Ok(decode_records(values, self.backend()))
    }
}

/// Read a whole catalog file, skipping entries that are not exercise-shaped.
pub async fn read_catalog(path: &Path) -> Result<Vec<Exercise>, StoreError> {
    let content = tokio::fs::read_to_string(path).await?;
    let values: Vec<Value> = serde_json::from_str(&content)?;
    Ok(decode_records(values, "json"))
}
