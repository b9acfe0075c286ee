//! `SQLite` KV backend: one `kv_entries` table behind an r2d2 pool.
//!
//! Methods on [`SqliteStore`] are synchronous; the [`KvStore`] impl runs
//! them on the tokio blocking pool.

#![allow(
    clippy::as_conversions,
    clippy::cast_possible_wrap,
    reason = "page sizes are bounded well below i64::MAX"
)]

use std::path::Path;

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::error::StorageError;
use crate::keys::Namespace;
use crate::migrations;
use crate::traits::{KeyPage, KvStore};

/// Type alias for pooled connection
pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Default pool size when `KEENDREAMS_DB_POOL_SIZE` is unset.
const DEFAULT_POOL_SIZE: u32 = 8;

/// Main storage struct wrapping `SQLite` connection pool
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

/// Concurrency settings applied to every pooled connection.
fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA busy_timeout = 30000;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

fn db_pool_size() -> u32 {
    keendreams_core::env_parse_with_default("KEENDREAMS_DB_POOL_SIZE", DEFAULT_POOL_SIZE).max(1)
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and runs migrations.
    ///
    /// # Errors
    /// Returns an error when the pool cannot be built or a migration fails.
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::file(db_path).with_init(init_connection);

        let pool_size = db_pool_size();
        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        // Run migrations on first connection
        let conn = pool.get()?;
        migrations::run_migrations(&conn).map_err(|e| StorageError::Migration(e.to_string()))?;
        drop(conn);

        tracing::info!(pool_size = pool_size, path = %db_path.display(), "SQLite store initialized");

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConn, StorageError> {
        Ok(self.pool.get()?)
    }

    /// Synchronous get.
    ///
    /// # Errors
    /// Returns an error on connection or query failure.
    pub fn get_sync(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE namespace = ?1 AND key = ?2",
                params![namespace.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Synchronous upsert.
    ///
    /// # Errors
    /// Returns an error on connection or query failure.
    pub fn put_sync(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv_entries (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value,
                                                      updated_at = excluded.updated_at",
            params![namespace.as_str(), key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Synchronous delete.
    ///
    /// # Errors
    /// Returns an error on connection or query failure.
    pub fn delete_sync(&self, namespace: Namespace, key: &str) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "DELETE FROM kv_entries WHERE namespace = ?1 AND key = ?2",
            params![namespace.as_str(), key],
        )?;
        Ok(affected > 0)
    }

    /// Synchronous prefix listing. Fetches one extra row to detect the end.
    ///
    /// Prefix matching uses `substr` rather than `LIKE`, which is
    /// case-insensitive for ASCII in `SQLite`.
    ///
    /// # Errors
    /// Returns an error on connection or query failure.
    pub fn list_sync(
        &self,
        namespace: Namespace,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<KeyPage, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT key FROM kv_entries
             WHERE namespace = ?1
               AND key >= ?2
               AND substr(key, 1, length(?2)) = ?2
               AND (?3 IS NULL OR key > ?3)
             ORDER BY key
             LIMIT ?4",
        )?;
        let fetch = limit.saturating_add(1) as i64;
        let mut keys = stmt
            .query_map(params![namespace.as_str(), prefix, cursor, fetch], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let list_complete = keys.len() <= limit;
        keys.truncate(limit);
        let cursor = if list_complete { None } else { keys.last().cloned() };
        Ok(KeyPage { keys, cursor, list_complete })
    }
}

/// Helper: run a blocking closure on the tokio blocking pool.
async fn blocking<F, T>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StorageError> {
        let store = self.clone();
        let key = key.to_owned();
        blocking(move || store.get_sync(namespace, &key)).await
    }

    async fn put(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StorageError> {
        let store = self.clone();
        let key = key.to_owned();
        let value = value.to_owned();
        blocking(move || store.put_sync(namespace, &key, &value)).await
    }

    async fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, StorageError> {
        let store = self.clone();
        let key = key.to_owned();
        blocking(move || store.delete_sync(namespace, &key)).await
    }

    async fn list(
        &self,
        namespace: Namespace,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<KeyPage, StorageError> {
        let store = self.clone();
        let prefix = prefix.to_owned();
        let cursor = cursor.map(ToOwned::to_owned);
        blocking(move || store.list_sync(namespace, &prefix, cursor.as_deref(), limit)).await
    }
}
