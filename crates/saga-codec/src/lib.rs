//! # saga-codec
//!
//! Text codecs for the single-blob wire format used by the
//! generation-facing store.
//!
//! A stored blob is, in order: zero or more `<segment_N>` blocks followed
//! by one raw record region wrapped in a kind-specific delimiter pair
//! (`<dialogue_log>` … `</dialogue_log>` and friends). In memory the
//! engine works on typed `Vec<SummarySegment>` / `Vec<Record>` fields;
//! this crate is the only place the blob layout is known.
//!
//! All decoding is tolerant: malformed lines, missing end delimiters,
//! duplicate segment indices, and foreign-kind regions sharing the blob
//! are absorbed with a `warn!`, never an error.

pub mod blob;
pub mod records;
pub mod segments;

pub use blob::{decode_entry_body, encode_entry_body};
pub use records::{
    append_to_region, decode_records, encode_records, extract_region, replace_region_body,
    wrap_region,
};
pub use segments::{
    DEFAULT_SEGMENT_SEPARATOR, combine_segments, extract_segments, format_segment_block,
    render_segments, strip_segments,
};
