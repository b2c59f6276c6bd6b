//! SQLite-backed `SettingsStore`.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        written_at INTEGER NOT NULL
    )
"#;

const UPSERT: &str = r#"
    INSERT INTO kv_store (key, value, written_at) VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value, written_at = excluded.written_at
"#;

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> BridgeError {
    move |e| BridgeError::OperationFailed(format!("{}: {}", context, e))
}

/// Durable string table in a single SQLite file.
///
/// Each key holds one row; writes replace the previous value atomically,
/// which is what the album cache relies on when it rewrites the whole
/// collection.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Open (or create) the database at `db_path`.
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let store = Self::open(options, 4).await?;
        debug!(path = %db_path.display(), "Opened settings database");
        Ok(store)
    }

    /// Private in-memory database.
    ///
    /// Limited to one connection since each `:memory:` connection is its own
    /// database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        Self::open(options, 1).await
    }

    async fn open(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to open settings database"))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(db_error("Failed to create settings table"))?;

        Ok(Self { pool })
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .bind(unix_now())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to write setting"))?;

        debug!(key, bytes = value.len(), "Setting written");
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to read setting"))?;

        row.map(|row| row.try_get::<String, _>("value"))
            .transpose()
            .map_err(db_error("Malformed setting row"))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete setting"))?;
        Ok(())
    }
}
