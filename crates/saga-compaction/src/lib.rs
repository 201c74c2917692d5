//! # saga-compaction
//!
//! The compaction orchestrator and its collaborators:
//!
//! - [`RetentionPolicy`] — carves a raw region into "older, compactable"
//!   and "recent, stays verbatim".
//! - [`Summarizer`] — the injected external generation call.
//! - [`extract_result`] — robust extraction of the usable summary from
//!   noisy summarizer output.
//! - [`CompactionEngine`] — the staged compaction state machine: one
//!   entry per cycle, stage → summarize → commit, explicit rollback,
//!   no auto-rollback on failure.
//! - [`Chronicle`] — the write-path facade that keeps the durable store
//!   reconciled on every append and on save switches.

pub mod chronicle;
pub mod engine;
pub mod extract;
pub mod retention;
pub mod summarizer;
pub mod types;

pub use chronicle::Chronicle;
pub use engine::CompactionEngine;
pub use extract::extract_result;
pub use retention::RetentionPolicy;
pub use summarizer::Summarizer;
pub use types::{CompactionInput, CompactionPreview, CompactionResult, SummaryRequest};
