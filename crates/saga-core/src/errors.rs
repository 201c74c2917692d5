//! Error hierarchy for the Saga engine.
//!
//! Built on [`thiserror`]:
//!
//! - [`SagaError`]: top-level enum covering all error domains
//! - [`StoreError`]: durable / generation store failures
//! - [`CompactionError`]: compaction-cycle failures
//!
//! Parse-level problems (malformed record lines, duplicate segment
//! indices) are not errors at all — the codec absorbs them locally with a
//! `warn!` and continues. Compaction-level problems surface to the caller
//! with the entry state unchanged.

use thiserror::Error;

use crate::ids::EntryKey;

/// Top-level error type for the Saga engine.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Store-layer error.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Compaction-cycle error.
    #[error("{0}")]
    Compaction(#[from] CompactionError),
}

/// Durable or generation store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named store is missing or not initialized. Callers treat reads
    /// against it as absent data rather than crashing the pipeline.
    #[error("store `{store}` is unavailable")]
    Unavailable {
        /// Logical store name.
        store: String,
    },

    /// A value could not be serialized or deserialized.
    #[error("serialization failed for store `{store}`: {source}")]
    Serialization {
        /// Logical store name.
        store: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// Backend-specific failure (e.g. sqlite).
    #[error("store backend error: {message}")]
    Backend {
        /// Backend error message.
        message: String,
    },
}

/// Failure of one compaction cycle.
///
/// Every variant leaves the entry's segments and raw region byte-identical
/// to their pre-call state. A staged entry stays staged on failure — the
/// caller decides whether to roll back (failure visibility is deliberate).
#[derive(Debug, Error)]
pub enum CompactionError {
    /// Nothing left to compact once the retention window and existing
    /// segments are removed. The summarizer is never called.
    #[error("nothing to compact for `{key}` after the retention window")]
    EmptyInput {
        /// Entry that had no compactable prefix.
        key: EntryKey,
    },

    /// The summarizer returned blank output (after cleanup).
    #[error("summarizer returned no usable content for `{key}`")]
    SummarizerEmpty {
        /// Entry whose compaction produced nothing.
        key: EntryKey,
    },

    /// The summarizer call itself failed.
    #[error("summarizer call failed for `{key}`: {message}")]
    SummarizerFailed {
        /// Entry whose compaction failed.
        key: EntryKey,
        /// Underlying error message.
        message: String,
    },

    /// No entry exists for the requested key.
    #[error("no entry found for `{key}`")]
    EntryNotFound {
        /// The missing key.
        key: EntryKey,
    },

    /// A rollback or commit was requested on an entry that is not staged.
    #[error("entry `{key}` is not staged")]
    NotStaged {
        /// The unstaged key.
        key: EntryKey,
    },

    /// Store failure during the compaction cycle.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::EntryKind;

    #[test]
    fn compaction_errors_name_the_entry() {
        let key = EntryKey::new("Aria", EntryKind::Dialogue);
        let err = CompactionError::EmptyInput { key };
        assert!(err.to_string().contains("Aria/dialogue"));
    }

    #[test]
    fn store_error_converts_into_compaction_error() {
        let store_err = StoreError::Unavailable {
            store: "subject_history".into(),
        };
        let err: CompactionError = store_err.into();
        assert!(matches!(err, CompactionError::Store(_)));
    }

    #[test]
    fn saga_error_wraps_both_domains() {
        let err: SagaError = StoreError::Backend {
            message: "disk full".into(),
        }
        .into();
        assert!(err.to_string().contains("disk full"));
    }
}
