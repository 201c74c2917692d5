//! # saga-tokens
//!
//! Deterministic size estimation for narrative text.
//!
//! The estimate is used purely as a threshold signal by the compaction
//! orchestrator — it does not need to match any real tokenizer, but it
//! must be a pure function of the text so tests are reproducible, and it
//! must be monotonic as text grows.
//!
//! Wide-script characters (CJK ideographs, kana, hangul, full-width
//! forms) cost roughly four times as much as narrow-script characters,
//! then the weighted total is scaled by a fixed calibration divisor.

pub mod estimator;

pub use estimator::{CALIBRATION_DIVISOR, WIDE_CHAR_WEIGHT, estimate, is_wide_char};
