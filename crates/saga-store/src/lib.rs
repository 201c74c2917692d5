//! # saga-store
//!
//! The two persistence projections of a subject's history and the glue
//! between them:
//!
//! - [`GenerationStore`] — the generation-facing text store: one container
//!   per save, one [`StoredEntry`] blob per `(subject, kind)`.
//! - [`DurableStore`] — the durable keyed store: authoritative per-subject
//!   record lists plus pending side-channel data (unconfirmed rounds,
//!   attribute deltas, pre-compaction snapshots).
//! - [`EntryRepository`] — typed entry operations over a generation store,
//!   including splice-based appends that never re-serialize unrelated
//!   blob content, and duplicate-entry repair on read.
//! - [`Reconciler`] — idempotent merging of the two projections.

pub mod durable;
pub mod generation;
pub mod reconcile;
pub mod repository;
pub mod sqlite;
pub mod stored;

pub use durable::{DurableStore, MemoryDurableStore};
pub use generation::{GenerationStore, MemoryGenerationStore};
pub use reconcile::{Reconciler, merge};
pub use repository::EntryRepository;
pub use sqlite::SqliteDurableStore;
pub use stored::StoredEntry;
