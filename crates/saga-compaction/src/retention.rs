//! Retention splitting.
//!
//! Compaction never touches the newest part of a raw region: the last
//! `retain_rounds` request/response rounds (two records each) survive
//! verbatim, and only the prefix before them is summarized. The count is
//! flat — records are not paired up, the split simply keeps the last
//! `min(2 * retain_rounds, len)` records.

use saga_core::Record;

/// Splits a raw region into a compactable prefix and a retained suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Rounds kept verbatim; one round is two records.
    pub retain_rounds: u32,
}

impl RetentionPolicy {
    /// Policy retaining the last `retain_rounds` rounds.
    #[must_use]
    pub fn new(retain_rounds: u32) -> Self {
        Self { retain_rounds }
    }

    /// Number of records the retained suffix holds at most.
    #[must_use]
    pub fn retain_count(&self) -> usize {
        self.retain_rounds as usize * 2
    }

    /// Split records into `(to_summarize, to_retain)`.
    ///
    /// When the region is no longer than the retention window the whole
    /// region is retained and the compactable prefix is empty.
    #[must_use]
    pub fn split(&self, records: &[Record]) -> (Vec<Record>, Vec<Record>) {
        let keep = self.retain_count().min(records.len());
        let cut = records.len() - keep;
        (records[..cut].to_vec(), records[cut..].to_vec())
    }
}
