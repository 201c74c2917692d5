//! # saga-core
//!
//! Foundation types for the Saga chronicle engine: records, entries,
//! summary segments, staging state, identity newtypes, the shared error
//! hierarchy, and tracing setup.
//!
//! Saga maintains unbounded append-only narrative logs for many
//! independent subjects and incrementally folds their older records into
//! immutable summary segments, keeping a verbatim recent window. This
//! crate holds the vocabulary every other `saga-*` crate speaks.

pub mod entry;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod records;

pub use entry::{Entry, StagingState, SummarySegment};
pub use errors::{CompactionError, SagaError, StoreError};
pub use ids::{EntryKey, SaveId, SubjectId};
pub use records::{EntryKind, Record};
