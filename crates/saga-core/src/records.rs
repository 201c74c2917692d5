//! Narrative records and entry kinds.
//!
//! A [`Record`] is one immutable log line: an in-fiction timestamp, an
//! optional sender, multi-line content, and a monotonic ingestion sort
//! key. Ordering is always by `sort_key` — the in-fiction timestamp is
//! display-only and not assumed sortable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of narrative log an entry holds.
///
/// Each kind owns a distinct raw-region delimiter name so that several
/// regions can coexist inside one text blob without interfering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    /// Conversational exchanges with a subject.
    Dialogue,
    /// Battle outcomes involving a subject.
    Battle,
    /// Training interactions with a subject.
    Training,
    /// Conquest events for a location.
    Conquest,
    /// Global event stream entries.
    Event,
    /// Derived resource status, recomputed wholesale each time.
    ResourceStatus,
}

impl EntryKind {
    /// Every kind, in a fixed order. Used when scanning a save for
    /// compaction candidates.
    pub const ALL: [EntryKind; 6] = [
        EntryKind::Dialogue,
        EntryKind::Battle,
        EntryKind::Training,
        EntryKind::Conquest,
        EntryKind::Event,
        EntryKind::ResourceStatus,
    ];

    /// Wire name of this kind (matches the serde representation).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Dialogue => "dialogue",
            EntryKind::Battle => "battle",
            EntryKind::Training => "training",
            EntryKind::Conquest => "conquest",
            EntryKind::Event => "event",
            EntryKind::ResourceStatus => "resource-status",
        }
    }

    /// Name of the start/end delimiter pair wrapping this kind's raw
    /// record region inside a blob.
    #[must_use]
    pub fn region_tag(self) -> &'static str {
        match self {
            EntryKind::Dialogue => "dialogue_log",
            EntryKind::Battle => "battle_log",
            EntryKind::Training => "training_log",
            EntryKind::Conquest => "conquest_log",
            EntryKind::Event => "event_log",
            EntryKind::ResourceStatus => "resource_status",
        }
    }

    /// Whether this kind's record set is recomputed wholesale on every
    /// write (replace semantics) rather than accumulated (append
    /// semantics).
    #[must_use]
    pub fn is_derived(self) -> bool {
        matches!(self, EntryKind::ResourceStatus)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable narrative record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Opaque in-fiction timestamp. Display-only; never sorted on.
    pub occurred_at: String,
    /// Who produced the record, if anyone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Record body. May span multiple lines.
    pub content: String,
    /// Monotonic ingestion order. The only sort key.
    pub sort_key: u64,
}

impl Record {
    /// Create a record with a sender.
    pub fn new(
        occurred_at: impl Into<String>,
        sender: impl Into<String>,
        content: impl Into<String>,
        sort_key: u64,
    ) -> Self {
        Self {
            occurred_at: occurred_at.into(),
            sender: Some(sender.into()),
            content: content.into(),
            sort_key,
        }
    }

    /// Create a record without a sender (system/narration lines).
    pub fn unsent(
        occurred_at: impl Into<String>,
        content: impl Into<String>,
        sort_key: u64,
    ) -> Self {
        Self {
            occurred_at: occurred_at.into(),
            sender: None,
            content: content.into(),
            sort_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names_match_serde() {
        for kind in EntryKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn region_tags_are_unique() {
        let mut tags: Vec<&str> = EntryKind::ALL.iter().map(|k| k.region_tag()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), EntryKind::ALL.len());
    }

    #[test]
    fn only_resource_status_is_derived() {
        for kind in EntryKind::ALL {
            assert_eq!(kind.is_derived(), kind == EntryKind::ResourceStatus);
        }
    }

    #[test]
    fn record_serde_camel_case() {
        let record = Record::new("Day 3, morning", "Aria", "Hello", 7);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("occurredAt"));
        assert!(json.contains("sortKey"));
    }

    #[test]
    fn unsent_record_omits_sender() {
        let record = Record::unsent("Day 1", "The gates fell.", 0);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("sender"));
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
