//! Data shapes exchanged across the compaction pipeline.

use serde::Serialize;

use saga_core::{EntryKey, Record, SummarySegment};

/// The split view of one entry, ready for a compaction cycle.
///
/// Produced by [`crate::RetentionPolicy::split`] plus the entry's
/// existing segments. Only `to_summarize` is ever rewritten; `to_retain`
/// survives verbatim and `prior_segments` are immutable context.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactionInput {
    /// Older records that will be folded into a new segment.
    pub to_summarize: Vec<Record>,
    /// Recent records kept verbatim after the compaction.
    pub to_retain: Vec<Record>,
    /// Segments from previous compactions, never re-summarized.
    pub prior_segments: Vec<SummarySegment>,
}

impl CompactionInput {
    /// True when there is nothing to fold into a segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_summarize.is_empty()
    }
}

/// What the orchestrator hands to a [`crate::Summarizer`].
///
/// Implementations wrap `text` in whatever prompt scaffolding their
/// backend needs; `prior_context`, when present, is strictly read-only
/// background and must not be folded into the output again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    /// Encoded records to compact, one `[timestamp] sender: content`
    /// line per record.
    pub text: String,
    /// Combined prior segment text, absent on a first compaction.
    pub prior_context: Option<String>,
}

/// Outcome of one committed compaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionResult {
    /// Entry that was compacted.
    pub key: EntryKey,
    /// Index of the freshly appended segment.
    pub segment_index: u32,
    /// How many records were folded into the segment.
    pub summarized_records: usize,
    /// How many records survive verbatim.
    pub retained_records: usize,
}

/// Non-mutating what-if sizing for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionPreview {
    /// Entry being sized.
    pub key: EntryKey,
    /// Estimated units of the raw region before compaction.
    pub units_before: u32,
    /// Estimated units of segment-plus-retained after compaction.
    pub units_after: u32,
    /// How many records would be folded.
    pub summarized_records: usize,
    /// How many records would survive verbatim.
    pub retained_records: usize,
    /// True when the entry has no segments yet.
    pub first_compaction: bool,
}
