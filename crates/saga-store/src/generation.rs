//! Generation-facing text store.
//!
//! Single-threaded cooperative model: every mutation is a full
//! read-modify-write of a container (`list` then `replace_all`), no
//! partial patches. [`MemoryGenerationStore`] is the in-process
//! implementation; deployments backed by an external text store implement
//! [`GenerationStore`] themselves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::stored::StoredEntry;

/// The generation-facing text store: named containers of entry blobs.
pub trait GenerationStore: Send + Sync {
    /// Create the container if it does not exist.
    fn ensure_container(&self, container: &str);

    /// All entries in a container. Empty if the container is missing.
    fn list(&self, container: &str) -> Vec<StoredEntry>;

    /// Replace the container's entries wholesale (last write wins).
    fn replace_all(&self, container: &str, entries: Vec<StoredEntry>);

    /// Allocate the next entry uid. Monotonically increasing.
    fn next_uid(&self) -> u64;
}

/// In-memory generation store.
#[derive(Debug, Default)]
pub struct MemoryGenerationStore {
    containers: Mutex<HashMap<String, Vec<StoredEntry>>>,
    uid_counter: AtomicU64,
}

impl MemoryGenerationStore {
    /// Create an empty store. Uids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose uid counter starts after `seed` (for tests
    /// that pin specific uids).
    #[must_use]
    pub fn with_uid_seed(seed: u64) -> Self {
        let store = Self::new();
        store.uid_counter.store(seed, Ordering::SeqCst);
        store
    }
}

impl GenerationStore for MemoryGenerationStore {
    fn ensure_container(&self, container: &str) {
        let _ = self
            .containers
            .lock()
            .entry(container.to_string())
            .or_default();
    }

    fn list(&self, container: &str) -> Vec<StoredEntry> {
        self.containers
            .lock()
            .get(container)
            .cloned()
            .unwrap_or_default()
    }

    fn replace_all(&self, container: &str, entries: Vec<StoredEntry>) {
        let _ = self
            .containers
            .lock()
            .insert(container.to_string(), entries);
    }

    fn next_uid(&self) -> u64 {
        self.uid_counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}
