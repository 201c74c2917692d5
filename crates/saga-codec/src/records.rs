//! Record line codec and kind-delimited region handling.
//!
//! Encode format, one record per header line:
//!
//! ```text
//! [<occurredAt>] <sender>: <content first line>
//! <content continuation lines, verbatim>
//! ```
//!
//! A record with no sender encodes with an empty sender field
//! (`[ts] : text`) so that decoding still recognizes the header line.
//!
//! Decoding scans line by line: a header line opens a new record and any
//! other line is appended to the open record's content, blank lines
//! included. Stray lines before the first header are logged and skipped
//! (blank ones silently).
//! Sort keys are positional (0-based) — the wire format does not carry
//! ingestion order.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use saga_core::{EntryKind, Record};

/// Header line: `[occurredAt] sender: content`. The sender group admits
/// the empty string so sender-less records round-trip.
static RECORD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.+?)\] (.*?): (.*)$").expect("valid regex"));

// ─────────────────────────────────────────────────────────────────────────────
// Record lines
// ─────────────────────────────────────────────────────────────────────────────

/// Encode records as newline-joined header/continuation lines.
#[must_use]
pub fn encode_records(records: &[Record]) -> String {
    let lines: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "[{}] {}: {}",
                r.occurred_at,
                r.sender.as_deref().unwrap_or(""),
                r.content
            )
        })
        .collect();
    lines.join("\n")
}

/// Decode a raw-region body back into records.
///
/// Malformed lines are skipped with a warning; an empty body yields an
/// empty list. Sort keys are assigned positionally.
#[must_use]
pub fn decode_records(text: &str) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = RECORD_LINE.captures(line) {
            let sender = match &caps[2] {
                "" => None,
                s => Some(s.to_string()),
            };
            let sort_key = records.len() as u64;
            records.push(Record {
                occurred_at: caps[1].to_string(),
                sender,
                content: caps[3].to_string(),
                sort_key,
            });
        } else if line.trim().is_empty() {
            // A blank line inside an open record is content; before any
            // record it carries nothing.
            if let Some(open) = records.last_mut() {
                open.content.push('\n');
            }
        } else if let Some(open) = records.last_mut() {
            open.content.push('\n');
            open.content.push_str(line);
        } else {
            warn!(line, "record line before any header, skipping");
        }
    }

    records
}

// ─────────────────────────────────────────────────────────────────────────────
// Kind-delimited regions
// ─────────────────────────────────────────────────────────────────────────────

fn start_tag(kind: EntryKind) -> String {
    format!("<{}>", kind.region_tag())
}

fn end_tag(kind: EntryKind) -> String {
    format!("</{}>", kind.region_tag())
}

/// Wrap a raw-region body in the kind's delimiter pair.
#[must_use]
pub fn wrap_region(kind: EntryKind, body: &str) -> String {
    if body.is_empty() {
        format!("{}\n{}", start_tag(kind), end_tag(kind))
    } else {
        format!("{}\n{}\n{}", start_tag(kind), body, end_tag(kind))
    }
}

/// Extract the body of the kind's region from a blob.
///
/// Returns `None` when the blob has no start delimiter for this kind.
/// A missing end delimiter is tolerated — the rest of the blob is treated
/// as the body. Regions belonging to other kinds are left alone.
#[must_use]
pub fn extract_region(blob: &str, kind: EntryKind) -> Option<String> {
    let start = start_tag(kind);
    let open = blob.find(&start)?;
    let body_start = open + start.len();
    let rest = &blob[body_start..];

    let body = match rest.find(&end_tag(kind)) {
        Some(close) => &rest[..close],
        None => {
            warn!(region = kind.region_tag(), "region missing end delimiter");
            rest
        }
    };

    Some(body.trim_matches('\n').to_string())
}

/// Insert encoded records immediately before the region's closing
/// delimiter, leaving every other byte of the blob untouched.
///
/// If the blob has no region for this kind, a fresh region is appended at
/// the end. If the start delimiter exists but the end delimiter is
/// missing, the records and a closing delimiter are appended, repairing
/// the region.
#[must_use]
pub fn append_to_region(blob: &str, kind: EntryKind, encoded: &str) -> String {
    if encoded.is_empty() {
        return blob.to_string();
    }

    let start = start_tag(kind);
    let end = end_tag(kind);

    let Some(open) = blob.find(&start) else {
        if blob.trim().is_empty() {
            return wrap_region(kind, encoded);
        }
        return format!("{}\n\n{}", blob.trim_end_matches('\n'), wrap_region(kind, encoded));
    };

    let after_open = open + start.len();
    match blob[after_open..].find(&end) {
        Some(rel_close) => {
            let close = after_open + rel_close;
            let head = &blob[..close];
            let tail = &blob[close..];
            if head.ends_with('\n') {
                format!("{head}{encoded}\n{tail}")
            } else {
                format!("{head}\n{encoded}\n{tail}")
            }
        }
        None => {
            warn!(
                region = kind.region_tag(),
                "region missing end delimiter, repairing on append"
            );
            format!("{}\n{encoded}\n{end}", blob.trim_end_matches('\n'))
        }
    }
}

/// Replace the entire body between the region's delimiters.
///
/// Used for derived regions whose record set is recomputed wholesale
/// (e.g. resource status). Content outside the region is untouched; a
/// missing region is appended at the end.
#[must_use]
pub fn replace_region_body(blob: &str, kind: EntryKind, body: &str) -> String {
    let start = start_tag(kind);
    let end = end_tag(kind);

    let Some(open) = blob.find(&start) else {
        if blob.trim().is_empty() {
            return wrap_region(kind, body);
        }
        return format!("{}\n\n{}", blob.trim_end_matches('\n'), wrap_region(kind, body));
    };

    let after_open = open + start.len();
    let head = &blob[..after_open];
    let new_body = if body.is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    };
    match blob[after_open..].find(&end) {
        Some(rel_close) => {
            let tail = &blob[after_open + rel_close..];
            format!("{head}\n{new_body}{tail}")
        }
        None => {
            warn!(
                region = kind.region_tag(),
                "region missing end delimiter, repairing on replace"
            );
            format!("{head}\n{new_body}{end}")
        }
    }
}
