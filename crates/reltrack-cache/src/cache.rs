use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Result cache keyed by operation name + serialized arguments
///
/// Backed by an in-memory SQLite database so nothing outlives the process.
/// The connection sits behind a mutex; share the manager through an `Arc`.
pub struct CacheManager {
    conn: Mutex<Connection>,
}

impl CacheManager {
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS responses (
                operation TEXT NOT NULL,
                arguments TEXT NOT NULL,
                data TEXT NOT NULL,
                cached_at INTEGER NOT NULL,
                PRIMARY KEY(operation, arguments)
            )",
            [],
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Look up a cached result. `None` means a miss.
    pub fn get<T: DeserializeOwned>(&self, operation: &str, arguments: &str) -> Result<Option<T>> {
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM responses WHERE operation = ?1 AND arguments = ?2",
                params![operation, arguments],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(json) => {
                debug!("Cache hit for {} {}", operation, arguments);
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => {
                debug!("Cache miss for {} {}", operation, arguments);
                Ok(None)
            }
        }
    }

    /// When the entry was written, if there is one
    pub fn cached_at(&self, operation: &str, arguments: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let stamp: Option<i64> = conn
            .query_row(
                "SELECT cached_at FROM responses WHERE operation = ?1 AND arguments = ?2",
                params![operation, arguments],
                |row| row.get(0),
            )
            .optional()?;

        Ok(stamp.and_then(DateTime::<Utc>::from_timestamp_millis))
    }

    /// Insert or replace a result
    pub fn set<T: Serialize>(&self, operation: &str, arguments: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO responses (operation, arguments, data, cached_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(operation, arguments)
             DO UPDATE SET data = excluded.data, cached_at = excluded.cached_at",
            params![operation, arguments, json, Utc::now().timestamp_millis()],
        )?;

        Ok(())
    }

    /// Drop every entry for one operation, whatever the arguments
    pub fn invalidate(&self, operation: &str) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM responses WHERE operation = ?1",
            params![operation],
        )?;

        if removed > 0 {
            debug!("Invalidated {} cached {} result(s)", removed, operation);
        }
        Ok(removed)
    }

    pub fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM responses", [])?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
