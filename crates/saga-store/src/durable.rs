//! Durable keyed store.
//!
//! The authoritative per-save persistence: plain, cycle-free JSON values
//! under `(store name, key)`. No durability guarantee beyond last write
//! wins. A missing store reads as absent data rather than an error, so a
//! half-initialized save never crashes the compaction pipeline.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;

use saga_core::StoreError;

/// Durable keyed store consumed by the reconciler.
pub trait DurableStore: Send + Sync {
    /// Read a value. `Ok(None)` when the store or key is absent.
    fn get(&self, store: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write a value (last write wins).
    fn put(&self, store: &str, key: &str, value: Value) -> Result<(), StoreError>;

    /// Delete a key. Absent keys are a no-op.
    fn delete(&self, store: &str, key: &str) -> Result<(), StoreError>;
}

/// In-memory durable store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryDurableStore {
    stores: Mutex<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryDurableStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryDurableStore {
    fn get(&self, store: &str, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .stores
            .lock()
            .get(store)
            .and_then(|s| s.get(key))
            .cloned())
    }

    fn put(&self, store: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let _ = self
            .stores
            .lock()
            .entry(store.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, store: &str, key: &str) -> Result<(), StoreError> {
        if let Some(s) = self.stores.lock().get_mut(store) {
            let _ = s.remove(key);
        }
        Ok(())
    }
}
