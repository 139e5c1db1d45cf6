//! SQLite catalog backend: schema, pragmas, migrations, and upserts.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};

use super::{DocumentStore, StoreError};
use crate::model::types::Exercise;

const SCHEMA_VERSION: i64 = 1;

const MIGRATION_V1: &str = r#"
CREATE TABLE IF NOT EXISTS exercises (
    id INTEGER PRIMARY KEY,
    collection TEXT NOT NULL,
    external_id TEXT NOT NULL,
    name TEXT NOT NULL,
    doc_json TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(collection, external_id)
);

CREATE INDEX IF NOT EXISTS idx_exercises_collection
    ON exercises(collection, id);
"#;

/// Local exercise catalog. Cloning shares the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path)?;
        apply_pragmas(&mut conn)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self, StoreError> {
        init_meta(&mut conn)?;
        migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert or replace `records` in `collection` inside one transaction.
    ///
    /// Reloading an id keeps its first position in store order.
    pub fn insert_exercises(
        &self,
        collection: &str,
        records: &[Exercise],
    ) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let now = now_millis();
        for record in records {
            tx.execute(
                "INSERT INTO exercises(collection, external_id, name, doc_json, updated_at) VALUES(?,?,?,?,?)
                 ON CONFLICT(collection, external_id) DO UPDATE SET name=excluded.name, doc_json=excluded.doc_json, updated_at=excluded.updated_at",
                params![
                    collection,
                    &record.id,
                    &record.name,
                    serde_json::to_string(record)?,
                    now
                ],
            )?;
        }
        tx.commit()?;
        tracing::info!(collection, records = records.len(), "insert_exercises");
        Ok(records.len())
    }

    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM exercises WHERE collection = ?",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn fetch(&self, collection: &str, limit: usize) -> Result<Vec<Exercise>, StoreError> {
        let conn = Arc::clone(&self.conn);
        let collection = collection.to_string();
        let docs = tokio::task::spawn_blocking(move || -> Result<Vec<String>, StoreError> {
            let conn = conn.lock();
            let mut stmt = conn.prepare(
                "SELECT doc_json FROM exercises WHERE collection = ? ORDER BY id LIMIT ?",
            )?;
            let rows = stmt.query_map(params![collection, limit as i64], |row| {
                row.get::<_, String>(0)
            })?;
            let mut docs = Vec::new();
            for doc in rows {
                docs.push(doc?);
            }
            Ok(docs)
        })
        .await??;

        let mut values = Vec::with_capacity(docs.len());
        for doc in docs {
            values.push(serde_json::from_str(&doc)?);
        }
        Ok(super::decode_records(values, self.backend()))
    }
}

fn apply_pragmas(conn: &mut Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        PRAGMA cache_size = -16384; -- 16MB
        "#,
    )?;
    Ok(())
}

fn init_meta(conn: &mut Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    if existing.is_none() {
        conn.execute("INSERT INTO meta(key, value) VALUES('schema_version', '0')", [])?;
    }

    Ok(())
}

fn migrate(conn: &mut Connection) -> Result<(), StoreError> {
    let current: i64 = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0).map(|s| s.parse().unwrap_or(0)),
        )
        .optional()?
        .unwrap_or(0);

    match current {
        0 => {
            conn.execute_batch(MIGRATION_V1)?;
            conn.execute(
                "UPDATE meta SET value = ? WHERE key = 'schema_version'",
                params![SCHEMA_VERSION.to_string()],
            )?;
        }
        v if v == SCHEMA_VERSION => {}
        v => return Err(StoreError::SchemaVersion(v)),
    }

    Ok(())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
