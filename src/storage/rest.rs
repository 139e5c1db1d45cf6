//! HTTP document store speaking the PostgREST dialect (`/{collection}?select=*&limit=N`).

use async_trait::async_trait;
use serde_json::Value;

use super::{DocumentStore, StoreError, decode_records, validate_collection};
use crate::model::types::Exercise;

pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("exsearch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    pub fn collection_url(&self, collection: &str, limit: usize) -> Result<String, StoreError> {
        validate_collection(collection)?;
        Ok(format!(
            "{}/{}?select=*&limit={}",
            self.base_url.trim_end_matches('/'),
            collection,
            limit
        ))
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn fetch(&self, collection: &str, limit: usize) -> Result<Vec<Exercise>, StoreError> {
        let url = self.collection_url(collection, limit)?;
        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut values: Vec<Value> = response.json().await?;
        // Some gateways ignore `limit`; enforce it here too.
        values.truncate(limit);
        Ok(decode_records(values, self.backend()))
    }
}
