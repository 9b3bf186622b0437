//! Key/value cache for content snapshots.
//!
//! One SQLite table, one row per key. Values are JSON text so the cache can
//! also hold records written by other tools.

use crate::error::{StorageError, StorageResult};
use folio_types::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// A cached content document and when it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSnapshot {
    pub content: Value,
    pub timestamp: Timestamp,
}

impl LocalSnapshot {
    /// Stamps `content` with the current time.
    pub fn now(content: Value) -> Self {
        Self {
            content,
            timestamp: Timestamp::now(),
        }
    }
}

/// Persistent key/value store backed by SQLite.
#[derive(Clone)]
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStore {
    /// Opens (or creates) a store at the given path, creating parent
    /// directories as needed.
    pub fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!("Opened local store at {}", path.display());
        Self::with_connection(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        self.lock()?.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    // ── Raw values ───────────────────────────────────────────────

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Timestamp::now().to_iso8601()],
        )?;
        Ok(())
    }

    /// Reads the value under `key`.
    pub fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .lock()?
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    // ── Snapshots ────────────────────────────────────────────────

    /// Writes a content snapshot under `key`.
    pub fn save_snapshot(&self, key: &str, snapshot: &LocalSnapshot) -> StorageResult<()> {
        let json = serde_json::to_string(snapshot)?;
        self.set_item(key, &json)?;
        debug!("Cached content snapshot under {key}");
        Ok(())
    }

    /// Reads the snapshot under `key`. A stored value that is not a valid
    /// snapshot is an error, not `None`.
    pub fn load_snapshot(&self, key: &str) -> StorageResult<Option<LocalSnapshot>> {
        match self.get_item(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
