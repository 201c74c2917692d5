//! `SQLite`-backed durable store.
//!
//! One `kv` table keyed by `(store, key)`, values as JSON text. All
//! access goes through a single mutex-guarded connection — the engine is
//! single-writer by design, so a pool would buy nothing.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use saga_core::StoreError;

use crate::durable::DurableStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    store TEXT NOT NULL,
    key   TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (store, key)
);
";

/// Durable store persisted to a `SQLite` database file.
pub struct SqliteDurableStore {
    conn: Mutex<Connection>,
}

impl SqliteDurableStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(backend)?;
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (tests, ephemeral runs).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend {
        message: err.to_string(),
    }
}

impl DurableStore for SqliteDurableStore {
    fn get(&self, store: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.conn.lock();
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM kv WHERE store = ?1 AND key = ?2",
                params![store, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;

        match raw {
            None => Ok(None),
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|source| StoreError::Serialization {
                    store: store.to_string(),
                    source,
                }),
        }
    }

    fn put(&self, store: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(&value).map_err(|source| StoreError::Serialization {
            store: store.to_string(),
            source,
        })?;
        let conn = self.conn.lock();
        let _ = conn
            .execute(
                "INSERT INTO kv (store, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT (store, key) DO UPDATE SET value = excluded.value",
                params![store, key, text],
            )
            .map_err(backend)?;
        Ok(())
    }

    fn delete(&self, store: &str, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let _ = conn
            .execute(
                "DELETE FROM kv WHERE store = ?1 AND key = ?2",
                params![store, key],
            )
            .map_err(backend)?;
        Ok(())
    }
}
