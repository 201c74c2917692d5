//! Entries, summary segments, and staging state.
//!
//! An [`Entry`] is the per-subject, per-kind container: an ordered list of
//! immutable [`SummarySegment`]s followed by the still-growing raw record
//! region. In memory the two parts are explicit typed fields; the single
//! text blob only exists at the generation-store boundary (see
//! `saga-codec`).
//!
//! Staging is a tagged state rather than a pair of booleans, so "staged
//! but no saved visibility" is unrepresentable: the `Staged` variant
//! always carries the visibility to restore on rollback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::EntryKey;
use crate::records::Record;

/// One immutable block of previously compacted narrative text.
///
/// Indices within an entry are strictly increasing starting at 1. Gaps
/// are tolerated on read but never produced on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarySegment {
    /// 1-based segment index.
    pub index: u32,
    /// Compacted narrative text, stored verbatim.
    pub text: String,
}

impl SummarySegment {
    /// Create a segment.
    pub fn new(index: u32, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Compaction staging state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum StagingState {
    /// Not part of an in-flight compaction.
    Idle,
    /// Hidden from the generation view while a compaction is in flight.
    #[serde(rename_all = "camelCase")]
    Staged {
        /// Visibility to restore if the compaction is rolled back.
        previous_enabled: bool,
    },
}

/// The per-subject, per-kind log container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Composite identity of this entry.
    pub key: EntryKey,
    /// Compacted segments, in index order.
    pub segments: Vec<SummarySegment>,
    /// Uncompacted records, in `sort_key` order.
    pub raw_region: Vec<Record>,
    /// Whether the entry is visible to the generation-facing view.
    pub enabled: bool,
    /// Compaction staging state.
    pub staging: StagingState,
    /// When the entry was first created.
    pub created_at: DateTime<Utc>,
    /// Stamped on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Create an empty, enabled, idle entry.
    #[must_use]
    pub fn new(key: EntryKey) -> Self {
        let now = Utc::now();
        Self {
            key,
            segments: Vec::new(),
            raw_region: Vec::new(),
            enabled: true,
            staging: StagingState::Idle,
            created_at: now,
            updated_at: now,
        }
    }

    /// Index the next appended segment must carry: one past the highest
    /// existing index, starting at 1.
    #[must_use]
    pub fn next_segment_index(&self) -> u32 {
        self.segments.iter().map(|s| s.index).max().unwrap_or(0) + 1
    }

    /// Whether a compaction is currently staged on this entry.
    #[must_use]
    pub fn is_staged(&self) -> bool {
        matches!(self.staging, StagingState::Staged { .. })
    }

    /// Stage the entry: remember current visibility, then hide it.
    ///
    /// No-op if already staged — the originally saved visibility is kept.
    pub fn stage(&mut self) {
        if self.is_staged() {
            return;
        }
        self.staging = StagingState::Staged {
            previous_enabled: self.enabled,
        };
        self.enabled = false;
        self.touch();
    }

    /// Roll a staged compaction back: restore the saved visibility and
    /// clear staging. Content is untouched.
    ///
    /// Returns `false` if the entry was not staged.
    pub fn rollback_staging(&mut self) -> bool {
        match self.staging {
            StagingState::Staged { previous_enabled } => {
                self.enabled = previous_enabled;
                self.staging = StagingState::Idle;
                self.touch();
                true
            }
            StagingState::Idle => false,
        }
    }

    /// Finish a committed compaction: clear staging and force the entry
    /// visible. The pre-staging visibility is deliberately not restored —
    /// a freshly compacted entry is always live.
    pub fn commit_staging(&mut self) {
        self.staging = StagingState::Idle;
        self.enabled = true;
        self.touch();
    }

    /// Stamp the audit timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
