//! SQLite-backed slot store
//!
//! One row per slot. The schema is created lazily on first use.

use super::KeyValueStore;
use crate::error::BuddyError;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tokio::sync::OnceCell;
use tracing::debug;

pub struct SqliteKeyValueStore {
    pool: SqlitePool,
    schema_ready: OnceCell<()>,
}

impl SqliteKeyValueStore {
    /// Connect to `database_url` (e.g. `sqlite://buddy.db`), creating the file if needed.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                BuddyError::DatabaseError(format!("Invalid database URL '{}': {}", database_url, e))
            })?
            .create_if_missing(true);

        // A single long-lived connection: one writer, and `sqlite::memory:`
        // databases vanish with their connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                BuddyError::DatabaseError(format!("Failed to open slot database: {}", e))
            })?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema_ready: OnceCell::new(),
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS kv_store (
                      key TEXT PRIMARY KEY NOT NULL,
                      value TEXT NOT NULL,
                      updated_at INTEGER NOT NULL
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                BuddyError::DatabaseError(format!("Failed to initialize slot schema: {}", e))
            })?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_schema().await?;

        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BuddyError::DatabaseError(format!("Failed to read slot {}: {}", key, e)))?;

        match row {
            Some(row) => {
                let value: String = row.try_get("value").map_err(|e| {
                    BuddyError::DatabaseError(format!("Failed to decode slot {}: {}", key, e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.ensure_schema().await?;

        debug!(key, bytes = value.len(), "Writing slot");

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
              value = excluded.value,
              updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| BuddyError::DatabaseError(format!("Failed to write slot {}: {}", key, e)))?;

        Ok(())
    }
}
