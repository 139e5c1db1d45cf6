pub mod config;
pub mod export;
pub mod model;
pub mod search;
pub mod storage;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{SearchConfig, StoreConfig, default_db_path};
use export::{ExportFormat, ExportOptions, export_result};
use model::types::{SearchFilters, SearchOptions};
use search::SearchClient;
use storage::DocumentStore;
use storage::json::{JsonFileStore, read_catalog};
use storage::rest::RestStore;
use storage::sqlite::SqliteStore;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "exsearch",
    version,
    about = "Fuzzy, cached search over fitness exercise catalogs"
)]
pub struct Cli {
    /// Path to the TOML config (defaults to $XDG_CONFIG_HOME/exsearch/config.toml)
    #[arg(long, global = true, env = "EXSEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the SQLite catalog; overrides the configured store
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the catalog
    Search {
        /// Free-text query; empty lists matches in store order
        #[arg(default_value = "")]
        query: String,

        /// Only exercises in this category (repeatable)
        #[arg(long = "category", value_name = "CATEGORY")]
        categories: Vec<String>,

        /// Only exercises using this equipment (repeatable)
        #[arg(long = "equipment", value_name = "EQUIPMENT")]
        equipment: Vec<String>,

        /// Only exercises whose primary muscles include this one (repeatable)
        #[arg(long = "muscle", value_name = "MUSCLE")]
        muscles: Vec<String>,

        #[arg(long)]
        difficulty: Option<String>,

        /// Maximum results (defaults to the configured default_limit)
        #[arg(long)]
        limit: Option<usize>,

        /// Include relevance scores
        #[arg(long)]
        scores: bool,

        /// Include instruction steps in Markdown and text output
        #[arg(long)]
        instructions: bool,

        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,

        /// Print the raw result as JSON (overrides --format)
        #[arg(long)]
        json: bool,
    },
    /// Upsert a JSON catalog (an array of exercises) into the SQLite catalog
    Load {
        catalog: PathBuf,
    },
    /// Print the effective configuration
    Config,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Search {
            query,
            categories,
            equipment,
            muscles,
            difficulty,
            limit,
            scores,
            instructions,
            format,
            json,
        } => {
            let mut filters = SearchFilters::default();
            if !categories.is_empty() {
                filters = filters.with_categories(categories);
            }
            if !equipment.is_empty() {
                filters = filters.with_equipment(equipment);
            }
            if !muscles.is_empty() {
                filters = filters.with_muscles(muscles);
            }
            if let Some(difficulty) = difficulty {
                filters = filters.with_difficulty(difficulty);
            }

            let mut options = SearchOptions::new(query).with_filters(filters);
            if let Some(limit) = limit {
                options = options.with_limit(limit);
            }
            if scores {
                options = options.with_scores();
            }

            let store = open_store(&config, cli.db.as_deref())?;
            let client = SearchClient::new(store, config.search_settings());
            let result = client.try_search(options).await.context("search failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let export_options = ExportOptions {
                    include_instructions: instructions,
                    ..Default::default()
                };
                print!("{}", export_result(&result, format, &export_options));
            }
            Ok(())
        }
        Commands::Load { catalog } => run_load(&config, cli.db.as_deref(), &catalog).await,
        Commands::Config => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => SearchConfig::config_path()?,
            };
            println!("# {}", path.display());
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SearchConfig> {
    let config = match path {
        Some(path) => SearchConfig::load_from(path),
        None => SearchConfig::load(),
    };
    config.context("loading configuration")
}

async fn run_load(config: &SearchConfig, db_override: Option<&Path>, catalog: &Path) -> Result<()> {
    let records = read_catalog(catalog)
        .await
        .with_context(|| format!("reading {}", catalog.display()))?;

    let db_path = sqlite_path(config, db_override)?;
    let store =
        SqliteStore::open(&db_path).with_context(|| format!("opening {}", db_path.display()))?;
    let n = store.insert_exercises(&config.collection, &records)?;
    println!("Loaded {n} exercises into {}", db_path.display());
    Ok(())
}

fn sqlite_path(config: &SearchConfig, db_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = db_override {
        return Ok(path.to_path_buf());
    }
    match &config.store {
        StoreConfig::Sqlite { path: Some(path) } => Ok(path.clone()),
        _ => Ok(default_db_path()?),
    }
}

/// Build the store named by the configuration; `--db` forces SQLite.
pub fn open_store(config: &SearchConfig, db_override: Option<&Path>) -> Result<Arc<dyn DocumentStore>> {
    if db_override.is_some() {
        let path = sqlite_path(config, db_override)?;
        return Ok(Arc::new(SqliteStore::open(&path)?));
    }

    let store: Arc<dyn DocumentStore> = match &config.store {
        StoreConfig::Sqlite { .. } => {
            let path = sqlite_path(config, None)?;
            Arc::new(
                SqliteStore::open(&path).with_context(|| format!("opening {}", path.display()))?,
            )
        }
        StoreConfig::Json { dir } => Arc::new(JsonFileStore::new(dir.clone())),
        StoreConfig::Rest {
            base_url,
            api_key_env,
        } => {
            let api_key = std::env::var(api_key_env).ok();
            if api_key.is_none() {
                tracing::warn!(api_key_env = %api_key_env, "no API key set for REST store");
            }
            Arc::new(RestStore::new(base_url.clone(), api_key)?)
        }
    };
    Ok(store)
}
