//! Configuration for the search client and its document store.
//!
//! Stored as TOML at `~/.config/exsearch/config.toml` (or the XDG
//! equivalent). A missing file means defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! collection = "exercises"
//! default_limit = 20
//! fetch_limit = 100
//! cache_ttl_secs = 300
//! debounce_ms = 300
//!
//! [weights]
//! exact_name = 100
//! fuzzy_tolerance = 2
//!
//! [store]
//! type = "rest"
//! base_url = "https://project.supabase.co/rest/v1"
//! api_key_env = "EXSEARCH_API_KEY"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::search::query::{
    DEFAULT_COLLECTION, DEFAULT_FETCH_LIMIT, DEFAULT_LIMIT, SearchSettings,
};
use crate::search::scoring::ScoringWeights;
use crate::storage::validate_collection;

pub const DEFAULT_API_KEY_ENV: &str = "EXSEARCH_API_KEY";

/// Errors that can occur when loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Store collection holding the exercises.
    pub collection: String,
    pub default_limit: usize,
    /// Minimum number of records fetched from the store on a cache miss.
    pub fetch_limit: usize,
    pub cache_ttl_secs: u64,
    pub debounce_ms: u64,
    pub weights: ScoringWeights,
    pub store: StoreConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            default_limit: DEFAULT_LIMIT,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            cache_ttl_secs: 300,
            debounce_ms: 300,
            weights: ScoringWeights::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Which document store backs the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Local SQLite catalog; `path` defaults to the platform data dir.
    Sqlite {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    /// Directory of `<collection>.json` files.
    Json { dir: PathBuf },
    /// PostgREST-compatible HTTP endpoint. The API key is read from `api_key_env`.
    Rest {
        base_url: String,
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Sqlite { path: None }
    }
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

impl SearchConfig {
    /// Load configuration from the default location.
    ///
    /// Returns the default config if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the default configuration file path.
    ///
    /// - Primary: `$XDG_CONFIG_HOME/exsearch/config.toml`
    /// - Fallback: platform config dir (e.g. `~/.config/exsearch/config.toml` on Linux)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join("exsearch").join("config.toml"));
        }

        dirs::config_dir()
            .map(|p| p.join("exsearch").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_collection(&self.collection)
            .map_err(|_| ConfigError::Validation(format!("Invalid collection name: {:?}", self.collection)))?;

        if self.default_limit == 0 {
            return Err(ConfigError::Validation("default_limit must be positive".into()));
        }

        if self.fetch_limit == 0 {
            return Err(ConfigError::Validation("fetch_limit must be positive".into()));
        }

        if let StoreConfig::Rest { base_url, .. } = &self.store
            && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(format!(
                "REST store base_url must be http(s): {base_url}"
            )));
        }

        Ok(())
    }

    /// Client settings derived from this configuration.
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            collection: self.collection.clone(),
            default_limit: self.default_limit,
            fetch_limit: self.fetch_limit,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            debounce: Duration::from_millis(self.debounce_ms),
            weights: self.weights,
        }
    }
}

/// Default location of the SQLite catalog.
pub fn default_db_path() -> Result<PathBuf, ConfigError> {
    directories::ProjectDirs::from("com", "exsearch", "exsearch")
        .map(|dirs| dirs.data_dir().join("catalog.db"))
        .ok_or(ConfigError::NoDataDir)
}
