//! Durable session storage
//!
//! The session store persists exactly two keys: `token` (opaque bearer
//! token) and `user` (JSON-serialized profile). Both are read once at
//! startup to hydrate the in-memory session; an absent key means no session.
//!
//! Persistence is abstracted behind [`SessionStorage`] so tests can
//! substitute [`MemoryStorage`] for the on-disk [`SqliteStorage`].

use async_trait::async_trait;
use rhymic_common::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::info;

/// Storage key holding the opaque bearer token
pub const KEY_TOKEN: &str = "token";

/// Storage key holding the JSON-serialized user profile
pub const KEY_USER: &str = "user";

/// Key/value persistence interface for session state
///
/// All mutations happen on the single client event thread and each operation
/// awaits its write before the in-memory state is updated, so no locking
/// beyond the adapter's own is needed.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read a value, `None` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; deleting an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<T: SessionStorage + ?Sized> SessionStorage for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }
}

// ========================================
// In-memory adapter
// ========================================

/// Volatile in-memory storage, primarily for tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

// ========================================
// SQLite adapter
// ========================================

/// Durable storage over a local SQLite database
///
/// Uses a single `session` key/value table. The database file and schema are
/// created on first open (idempotent, safe to call multiple times).
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if needed) the session database at the given path
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        if newly_created {
            info!("Initialized new session database: {}", db_path.display());
        } else {
            info!("Opened existing session database: {}", db_path.display());
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SessionStorage for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM session WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO session (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM session WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
