//! The generation-store wire representation of an entry.
//!
//! A [`StoredEntry`] carries the single text blob (segments followed by
//! the raw record region) plus typed side-channel metadata. Conversion to
//! and from the structured [`Entry`] happens here, at the serialization
//! boundary — nothing above this layer parses blobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use saga_codec::{decode_entry_body, encode_entry_body};
use saga_core::{Entry, EntryKey, EntryKind, StagingState, SubjectId};

/// One entry as held by the generation-facing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    /// Store-assigned identity, monotonically increasing. The tiebreaker
    /// when duplicate entries for one key are collapsed (lowest wins).
    pub uid: u64,
    /// Subject this entry belongs to.
    pub subject: SubjectId,
    /// Entry kind.
    pub kind: EntryKind,
    /// The single text blob: segment blocks then the raw record region.
    pub content: String,
    /// Visibility toward downstream generation calls.
    pub enabled: bool,
    /// Compaction staging state.
    pub staging: StagingState,
    /// Creation stamp.
    pub created_at: DateTime<Utc>,
    /// Stamped on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl StoredEntry {
    /// Composite key of this entry.
    #[must_use]
    pub fn key(&self) -> EntryKey {
        EntryKey {
            subject: self.subject.clone(),
            kind: self.kind,
        }
    }

    /// Serialize a structured entry into its wire form.
    #[must_use]
    pub fn from_entry(uid: u64, entry: &Entry) -> Self {
        Self {
            uid,
            subject: entry.key.subject.clone(),
            kind: entry.key.kind,
            content: encode_entry_body(&entry.segments, entry.key.kind, &entry.raw_region),
            enabled: entry.enabled,
            staging: entry.staging,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }

    /// Decode the blob back into a structured entry.
    #[must_use]
    pub fn to_entry(&self) -> Entry {
        let (segments, raw_region) = decode_entry_body(&self.content, self.kind);
        Entry {
            key: self.key(),
            segments,
            raw_region,
            enabled: self.enabled,
            staging: self.staging,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_core::{Record, SummarySegment};

    #[test]
    fn entry_round_trips_through_wire_form() {
        let mut entry = Entry::new(EntryKey::new("Aria", EntryKind::Dialogue));
        entry.segments.push(SummarySegment::new(1, "Week one."));
        entry.raw_region.push(Record::new("Day 8", "Aria", "onward", 0));

        let stored = StoredEntry::from_entry(7, &entry);
        assert_eq!(stored.uid, 7);
        assert!(stored.content.contains("<segment_1>"));
        assert!(stored.content.contains("<dialogue_log>"));

        let back = stored.to_entry();
        assert_eq!(back, entry);
    }

    #[test]
    fn staging_state_survives_the_wire() {
        let mut entry = Entry::new(EntryKey::new("Aria", EntryKind::Battle));
        entry.stage();
        let stored = StoredEntry::from_entry(1, &entry);
        assert_eq!(
            stored.to_entry().staging,
            StagingState::Staged {
                previous_enabled: true
            }
        );
    }
}
