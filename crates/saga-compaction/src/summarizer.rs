//! The summarizer seam.
//!
//! The orchestrator never talks to a generation backend directly; it
//! hands a [`SummaryRequest`] to whatever [`Summarizer`] was injected.
//! Implementations own prompt construction, transport, and retries. The
//! orchestrator owns everything else: what goes in, how the raw reply is
//! cleaned up, and what a failure means for entry state.

use std::error::Error;

use async_trait::async_trait;

use crate::types::SummaryRequest;

/// An external text-generation call that folds records into narrative.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a summary for the request.
    ///
    /// The reply may be wrapped in arbitrary scaffolding (`<result>`
    /// tags, reasoning preamble); the orchestrator extracts the usable
    /// part. Errors are surfaced as
    /// [`CompactionError::SummarizerFailed`](saga_core::CompactionError)
    /// and leave the entry untouched.
    async fn summarize(
        &self,
        request: &SummaryRequest,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;
}
