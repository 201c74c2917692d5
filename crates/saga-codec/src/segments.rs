//! Summary segment blocks: extraction, deduplication, combination, strip.
//!
//! A segment block looks like:
//!
//! ```text
//! <segment_3>
//! Condensed narrative text.
//! </segment_3>
//! ```
//!
//! Duplicate indices are a corruption symptom; the first occurrence in
//! document order wins, the rest are dropped with a warning. Two
//! different texts are never merged under one index.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use saga_core::SummarySegment;

/// Separator used when combining segment texts into one context block.
pub const DEFAULT_SEGMENT_SEPARATOR: &str = "\n\n";

static SEGMENT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<segment_(\d+)>").expect("valid regex"));

/// A recognized segment block inside a blob.
struct SegmentBlock {
    index: u32,
    /// Byte range of the whole block, start tag through end tag.
    range: std::ops::Range<usize>,
    text: String,
}

/// Scan a blob for well-formed segment blocks, in document order.
///
/// A block is recognized only when its end tag is present and the index
/// parses; anything else is skipped with a warning.
fn scan_blocks(text: &str) -> Vec<SegmentBlock> {
    let mut blocks = Vec::new();

    for caps in SEGMENT_START.captures_iter(text) {
        let whole = caps.get(0).expect("match always has group 0");
        let Ok(index) = caps[1].parse::<u32>() else {
            warn!(raw = &caps[1], "segment index out of range, skipping block");
            continue;
        };

        let end = format!("</segment_{index}>");
        let Some(rel) = text[whole.end()..].find(&end) else {
            warn!(index, "segment block missing end tag, skipping");
            continue;
        };

        let body_end = whole.end() + rel;
        blocks.push(SegmentBlock {
            index,
            range: whole.start()..body_end + end.len(),
            text: text[whole.end()..body_end].trim_matches('\n').to_string(),
        });
    }

    blocks
}

/// Extract every segment block from a blob, deduplicated by index.
///
/// On a duplicate index the first occurrence in document order is kept
/// and the rest are discarded with a warning.
#[must_use]
pub fn extract_segments(text: &str) -> Vec<SummarySegment> {
    let mut seen: HashSet<u32> = HashSet::new();
    let mut segments = Vec::new();

    for block in scan_blocks(text) {
        if seen.insert(block.index) {
            segments.push(SummarySegment {
                index: block.index,
                text: block.text,
            });
        } else {
            warn!(
                index = block.index,
                "duplicate segment index, keeping first occurrence"
            );
        }
    }

    segments
}

/// Join segment texts verbatim in index order, regardless of gaps.
///
/// This is the read-only prior context handed to the summarizer on
/// incremental compactions.
#[must_use]
pub fn combine_segments(segments: &[SummarySegment], separator: &str) -> String {
    let mut ordered: Vec<&SummarySegment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.index);
    ordered
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Format one segment as a tagged block.
#[must_use]
pub fn format_segment_block(segment: &SummarySegment) -> String {
    format!(
        "<segment_{index}>\n{text}\n</segment_{index}>",
        index = segment.index,
        text = segment.text
    )
}

/// Render segments as tagged blocks in index order, joined by blank
/// lines. This is the writable counterpart of [`extract_segments`].
#[must_use]
pub fn render_segments(segments: &[SummarySegment]) -> String {
    let mut ordered: Vec<&SummarySegment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.index);
    ordered
        .iter()
        .map(|s| format_segment_block(s))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Remove every recognized segment block (plus immediately trailing blank
/// lines), returning only the trimmed non-segment remainder.
#[must_use]
pub fn strip_segments(text: &str) -> String {
    let blocks = scan_blocks(text);
    if blocks.is_empty() {
        return text.trim().to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for block in &blocks {
        if block.range.start > cursor {
            out.push_str(&text[cursor..block.range.start]);
        }
        cursor = block.range.end.max(cursor);
        // Swallow blank lines that immediately followed the block.
        let rest = &text[cursor..];
        let skipped = rest.len() - rest.trim_start_matches(['\n', '\r']).len();
        cursor += skipped;
    }
    out.push_str(&text[cursor..]);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(index: u32, text: &str) -> SummarySegment {
        SummarySegment::new(index, text)
    }

    // -- extract --

    #[test]
    fn extract_single_block() {
        let text = "<segment_1>\nThe first month, condensed.\n</segment_1>";
        let segments = extract_segments(text);
        assert_eq!(segments, vec![seg(1, "The first month, condensed.")]);
    }

    #[test]
    fn extract_multiple_blocks_in_document_order() {
        let text = "<segment_2>\nlater\n</segment_2>\n\n<segment_1>\nearlier\n</segment_1>";
        let segments = extract_segments(text);
        assert_eq!(segments, vec![seg(2, "later"), seg(1, "earlier")]);
    }

    #[test]
    fn extract_keeps_first_on_duplicate_index() {
        let text = "<segment_3>\nA\n</segment_3>\n\nnoise\n\n<segment_3>\nB\n</segment_3>";
        let segments = extract_segments(text);
        assert_eq!(segments, vec![seg(3, "A")]);
    }

    #[test]
    fn extract_skips_block_without_end_tag() {
        let text = "<segment_1>\ndangling";
        assert!(extract_segments(text).is_empty());
    }

    #[test]
    fn extract_from_plain_text_is_empty() {
        assert!(extract_segments("no segments at all").is_empty());
    }

    // -- combine --

    #[test]
    fn combine_joins_in_index_order_despite_gaps() {
        let segments = vec![seg(5, "five"), seg(1, "one"), seg(3, "three")];
        assert_eq!(
            combine_segments(&segments, DEFAULT_SEGMENT_SEPARATOR),
            "one\n\nthree\n\nfive"
        );
    }

    #[test]
    fn combine_empty_is_empty() {
        assert_eq!(combine_segments(&[], DEFAULT_SEGMENT_SEPARATOR), "");
    }

    // -- render / strip --

    #[test]
    fn render_formats_tagged_blocks() {
        let segments = vec![seg(1, "first"), seg(2, "second")];
        assert_eq!(
            render_segments(&segments),
            "<segment_1>\nfirst\n</segment_1>\n\n<segment_2>\nsecond\n</segment_2>"
        );
    }

    #[test]
    fn strip_removes_blocks_and_trailing_blank_lines() {
        let text = "<segment_1>\nsummary\n</segment_1>\n\n\n<dialogue_log>\n[Day 1] Aria: hi\n</dialogue_log>";
        assert_eq!(
            strip_segments(text),
            "<dialogue_log>\n[Day 1] Aria: hi\n</dialogue_log>"
        );
    }

    #[test]
    fn strip_plain_text_just_trims() {
        assert_eq!(strip_segments("  hello  \n"), "hello");
    }

    #[test]
    fn strip_then_render_round_trips_the_segment_set() {
        let text = "<segment_1>\nalpha\n</segment_1>\n\n<segment_2>\nbeta\n</segment_2>\n\n<battle_log>\n[Day 1] : clash\n</battle_log>";
        let original = extract_segments(text);
        let rebuilt = format!("{}\n\n{}", render_segments(&original), strip_segments(text));
        assert_eq!(extract_segments(&rebuilt), original);
    }

    #[test]
    fn strip_leaves_unrecognized_dangling_block_alone() {
        let text = "<segment_1>\ndone\n</segment_1>\n<segment_9>\nno end tag";
        let stripped = strip_segments(text);
        assert!(stripped.contains("<segment_9>"));
        assert!(!stripped.contains("done"));
    }
}
