//! Whole-blob assembly at the generation-store boundary.
//!
//! One stored entry is a single string: zero or more segment blocks,
//! blank-line separated, followed by the kind's raw record region.

use saga_core::{EntryKind, Record, SummarySegment};

use crate::records::{decode_records, encode_records, extract_region, wrap_region};
use crate::segments::{extract_segments, render_segments};

/// Encode segments plus raw records into the single-blob wire layout.
#[must_use]
pub fn encode_entry_body(
    segments: &[SummarySegment],
    kind: EntryKind,
    records: &[Record],
) -> String {
    let region = wrap_region(kind, &encode_records(records));
    if segments.is_empty() {
        region
    } else {
        format!("{}\n\n{region}", render_segments(segments))
    }
}

/// Decode a stored blob back into its segments and this kind's records.
///
/// An absent or empty region yields an empty record list; segments from
/// the whole blob are extracted regardless of position.
#[must_use]
pub fn decode_entry_body(blob: &str, kind: EntryKind) -> (Vec<SummarySegment>, Vec<Record>) {
    let segments = extract_segments(blob);
    let records = extract_region(blob, kind)
        .map(|body| decode_records(&body))
        .unwrap_or_default();
    (segments, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_without_segments_is_bare_region() {
        let records = vec![Record::new("Day 1", "Aria", "hello", 0)];
        let blob = encode_entry_body(&[], EntryKind::Dialogue, &records);
        assert_eq!(blob, "<dialogue_log>\n[Day 1] Aria: hello\n</dialogue_log>");
    }

    #[test]
    fn encode_places_segments_before_region() {
        let segments = vec![SummarySegment::new(1, "The first week.")];
        let records = vec![Record::new("Day 8", "Aria", "onward", 0)];
        let blob = encode_entry_body(&segments, EntryKind::Dialogue, &records);
        assert_eq!(
            blob,
            "<segment_1>\nThe first week.\n</segment_1>\n\n<dialogue_log>\n[Day 8] Aria: onward\n</dialogue_log>"
        );
    }

    #[test]
    fn blob_round_trip() {
        let segments = vec![
            SummarySegment::new(1, "Month one."),
            SummarySegment::new(2, "Month two."),
        ];
        let records = vec![
            Record::new("Day 61", "Aria", "a new month", 0),
            Record::unsent("Day 62", "The rains came.", 1),
        ];
        let blob = encode_entry_body(&segments, EntryKind::Event, &records);
        let (seg_back, rec_back) = decode_entry_body(&blob, EntryKind::Event);
        assert_eq!(seg_back, segments);
        assert_eq!(rec_back, records);
    }

    #[test]
    fn decode_empty_blob() {
        let (segments, records) = decode_entry_body("", EntryKind::Battle);
        assert!(segments.is_empty());
        assert!(records.is_empty());
    }

    #[test]
    fn decode_ignores_foreign_region_records() {
        let blob = "<training_log>\n[Day 1] : drill\n</training_log>";
        let (_, records) = decode_entry_body(blob, EntryKind::Dialogue);
        assert!(records.is_empty());
    }
}
