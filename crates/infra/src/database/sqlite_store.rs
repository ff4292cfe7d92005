//! SQLite-backed key-value store.
//!
//! Implements the `KeyValueStore` port on a single `kv_store` table. Keys
//! enumerate in insertion order (rowid), overwrites keep their original
//! position, and an optional byte quota is enforced inside the write
//! transaction so a rejected write leaves the previous value untouched.

use std::fmt;
use std::path::{Path, PathBuf};

use flowstash_common::storage::{
    entry_size, KeyValueStore, StorageError, StorageMetrics, StorageMetricsSnapshot,
    StorageResult,
};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Durable [`KeyValueStore`] on a SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    quota_bytes: Option<usize>,
    metrics: StorageMetrics,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .field("quota_bytes", &self.quota_bytes)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database file at `path`
    ///
    /// # Errors
    /// Returns `StorageError::Unavailable` when the file cannot be opened
    /// and `StorageError::Backend` when the schema cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|e| {
            StorageError::Unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        let store = Self::from_connection(conn, Some(path))?;
        info!(db_path = ?store.path, "sqlite key-value store opened");
        Ok(store)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    /// Same conditions as [`SqliteStore::open`].
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Unavailable(format!("cannot open in-memory db: {e}")))?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA_SQL).map_err(backend_error)?;
        Ok(Self { conn: Mutex::new(conn), path, quota_bytes: None, metrics: StorageMetrics::new() })
    }

    /// Reject writes once the stored bytes would exceed `quota_bytes`
    #[must_use]
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn quota_bytes(&self) -> Option<usize> {
        self.quota_bytes
    }

    /// Bytes currently accounted against the quota
    ///
    /// # Errors
    /// Returns `StorageError::Backend` when the query fails.
    pub fn used_bytes(&self) -> StorageResult<usize> {
        let conn = self.conn.lock();
        query_used_bytes(&conn)
    }

    /// Operation counters
    pub fn metrics(&self) -> StorageMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(backend_error)?;
        self.metrics.record_read();
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(backend_error)?;

        if let Some(limit) = self.quota_bytes {
            let used = query_used_bytes(&tx)?;
            let previous: Option<String> = tx
                .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(backend_error)?;
            let previous = previous.map_or(0, |old| entry_size(key, &old));
            let needed = used - previous + entry_size(key, value);

            if needed > limit {
                self.metrics.record_quota_rejection();
                warn!(key, needed, limit, "sqlite store quota exceeded");
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        let written = tx
            .execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .and_then(|_| tx.commit());
        if let Err(err) = written {
            self.metrics.record_failed_write();
            return Err(backend_error(err));
        }

        self.metrics.record_write();
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(backend_error)?;
        self.metrics.record_removal();
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY rowid").map_err(backend_error)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(backend_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend_error)?;
        Ok(keys)
    }

    fn len(&self) -> StorageResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .map_err(backend_error)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

// ============================================================================
// Synchronous SQL helpers
// ============================================================================

/// Total of key and value lengths in bytes
fn query_used_bytes(conn: &Connection) -> StorageResult<usize> {
    let used: i64 = conn
        .query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM kv_store",
            [],
            |row| row.get(0),
        )
        .map_err(backend_error)?;
    Ok(usize::try_from(used).unwrap_or_default())
}

fn backend_error(err: rusqlite::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}
