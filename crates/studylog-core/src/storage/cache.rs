//! Durable local snapshot cache.
//!
//! A SQLite key-value table holding a serialized subset of store state:
//! goals, streak fields and the motivation score. The session list is
//! deliberately excluded -- the remote store is authoritative for history,
//! and a stale local copy would race with other devices. The cache is a
//! best-effort mirror, reconciled on every load.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::data_dir;
use crate::error::{CacheError, CoreError};
use crate::model::{Goals, StreakState};

const SNAPSHOT_KEY: &str = "state_snapshot";

/// Serialized subset of store state held in the local cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub goals: Goals,
    pub streak: StreakState,
    pub motivation: u8,
}

/// SQLite-backed key-value cache under the user data directory.
pub struct SnapshotCache {
    conn: Connection,
}

impl SnapshotCache {
    /// Open the cache at `~/.config/studylog/studylog.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("studylog.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the cache at an explicit path (tests use a temp dir).
    pub fn open_at(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(|source| CacheError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let cache = Self { conn };
        cache.migrate()?;
        Ok(cache)
    }

    /// Open an in-memory cache (for tests).
    pub fn open_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.migrate()?;
        Ok(cache)
    }

    fn migrate(&self) -> Result<(), CacheError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    // ── Snapshot ─────────────────────────────────────────────────────

    /// Persist the snapshot, overwriting any previous one.
    pub fn save(&self, snapshot: &StateSnapshot) -> Result<(), CacheError> {
        let json = serde_json::to_string(snapshot)?;
        self.kv_set(SNAPSHOT_KEY, &json)
    }

    /// Load the snapshot if one was previously saved.
    pub fn load(&self) -> Result<Option<StateSnapshot>, CacheError> {
        match self.kv_get(SNAPSHOT_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Drop the snapshot (sign-out path).
    pub fn clear(&self) -> Result<(), CacheError> {
        self.kv_delete(SNAPSHOT_KEY)
    }

    // ── Raw key-value ────────────────────────────────────────────────

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), CacheError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}
