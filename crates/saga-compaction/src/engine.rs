//! The compaction orchestrator.
//!
//! Drives the staged compaction state machine for one save: pick at most
//! one over-threshold entry per cycle, stage it (hide from the
//! generation view), call the summarizer, and commit the new segment
//! with the retention window re-attached verbatim.
//!
//! Failure semantics are deliberate: a failed summarizer call leaves the
//! entry staged and byte-identical. Staying staged makes the failure
//! visible instead of silently retrying; the caller decides whether to
//! retry [`CompactionEngine::execute`] or roll back with
//! [`CompactionEngine::cancel`].

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use saga_codec::{DEFAULT_SEGMENT_SEPARATOR, combine_segments, encode_records};
use saga_core::{CompactionError, Entry, EntryKey, EntryKind, SaveId, SummarySegment};
use saga_settings::{SagaSettings, ThresholdSettings};
use saga_store::{DurableStore, EntryRepository, GenerationStore, Reconciler};
use saga_tokens::estimate;

use crate::extract::extract_result;
use crate::retention::RetentionPolicy;
use crate::summarizer::Summarizer;
use crate::types::{CompactionInput, CompactionPreview, CompactionResult, SummaryRequest};

/// Orchestrates compaction cycles over one repository/reconciler pair.
pub struct CompactionEngine<'a, G: GenerationStore, D: DurableStore> {
    repository: &'a EntryRepository<G>,
    reconciler: &'a Reconciler<D>,
    thresholds: ThresholdSettings,
    retention: RetentionPolicy,
    summarizer_timeout: Duration,
}

impl<'a, G: GenerationStore, D: DurableStore> CompactionEngine<'a, G, D> {
    /// Engine configured from settings.
    pub fn new(
        repository: &'a EntryRepository<G>,
        reconciler: &'a Reconciler<D>,
        settings: &SagaSettings,
    ) -> Self {
        Self {
            repository,
            reconciler,
            thresholds: settings.thresholds.clone(),
            retention: RetentionPolicy::new(settings.retain_rounds),
            summarizer_timeout: Duration::from_secs(settings.summarizer_timeout_secs),
        }
    }

    /// Split one entry into its compaction input.
    #[must_use]
    pub fn input_for(&self, entry: &Entry) -> CompactionInput {
        let (to_summarize, to_retain) = self.retention.split(&entry.raw_region);
        CompactionInput {
            to_summarize,
            to_retain,
            prior_segments: entry.segments.clone(),
        }
    }

    /// Find the first entry whose compactable prefix exceeds its kind's
    /// threshold. At most one candidate per cycle; staged entries are
    /// skipped (their compaction is already in flight).
    pub fn find_candidate(&self, save: &SaveId) -> Option<EntryKey> {
        for entry in self.repository.list(save) {
            if entry.is_staged() {
                debug!(key = %entry.key, "skipping staged entry");
                continue;
            }
            let input = self.input_for(&entry);
            if input.is_empty() {
                continue;
            }
            let units = estimate(&encode_records(&input.to_summarize));
            let threshold = self.thresholds.for_kind(entry.key.kind);
            if units > threshold {
                debug!(key = %entry.key, units, threshold, "compaction candidate");
                return Some(entry.key);
            }
        }
        None
    }

    /// Stage an entry for compaction: save its visibility, hide it from
    /// the generation view. Staging an already-staged entry is a no-op.
    pub fn stage(&self, save: &SaveId, key: &EntryKey) -> Result<(), CompactionError> {
        let mut entry = self
            .repository
            .get(save, key)
            .ok_or_else(|| CompactionError::EntryNotFound { key: key.clone() })?;
        entry.stage();
        self.repository.upsert(save, &entry);
        info!(key = %key, "entry staged for compaction");
        Ok(())
    }

    /// Cancel a staged compaction: restore the saved visibility exactly
    /// and clear staging. Content is untouched.
    pub fn cancel(&self, save: &SaveId, key: &EntryKey) -> Result<(), CompactionError> {
        let mut entry = self
            .repository
            .get(save, key)
            .ok_or_else(|| CompactionError::EntryNotFound { key: key.clone() })?;
        if !entry.rollback_staging() {
            return Err(CompactionError::NotStaged { key: key.clone() });
        }
        self.repository.upsert(save, &entry);
        info!(key = %key, "staged compaction cancelled");
        Ok(())
    }

    /// Run a staged entry through the summarizer and commit the result.
    ///
    /// On success the compactable prefix is folded into a fresh segment,
    /// the retention window is re-attached verbatim, and the entry comes
    /// back visible. On failure the entry stays staged and its content is
    /// byte-identical to the pre-call state.
    pub async fn execute(
        &self,
        save: &SaveId,
        key: &EntryKey,
        summarizer: &dyn Summarizer,
    ) -> Result<CompactionResult, CompactionError> {
        let mut entry = self
            .repository
            .get(save, key)
            .ok_or_else(|| CompactionError::EntryNotFound { key: key.clone() })?;
        if !entry.is_staged() {
            return Err(CompactionError::NotStaged { key: key.clone() });
        }

        let input = self.input_for(&entry);
        if input.is_empty() {
            return Err(CompactionError::EmptyInput { key: key.clone() });
        }

        let request = SummaryRequest {
            text: encode_records(&input.to_summarize),
            prior_context: if entry.segments.is_empty() {
                None
            } else {
                Some(combine_segments(&entry.segments, DEFAULT_SEGMENT_SEPARATOR))
            },
        };

        let raw = self.call_summarizer(key, summarizer, &request).await?;

        let summary = extract_result(&raw);
        if summary.is_empty() {
            warn!(key = %key, "summarizer returned nothing usable, entry stays staged");
            return Err(CompactionError::SummarizerEmpty { key: key.clone() });
        }

        // Side-channel durable data is persisted before the raw records
        // are folded away. The history re-sync is idempotent, and the
        // folded prefix is marked so save activation never adopts it
        // back into the raw region.
        if key.kind == EntryKind::Dialogue {
            self.reconciler
                .sync_on_append(save, &key.subject, &input.to_summarize);
            self.reconciler
                .mark_folded(save, &key.subject, &input.to_summarize);
        }
        self.reconciler.flush_pending(save, &key.subject);

        let segment_index = entry.next_segment_index();
        entry
            .segments
            .push(SummarySegment::new(segment_index, summary));
        entry.raw_region = input.to_retain.clone();
        entry.commit_staging();
        self.repository.upsert(save, &entry);

        info!(
            key = %key,
            segment_index,
            summarized = input.to_summarize.len(),
            retained = input.to_retain.len(),
            "compaction committed"
        );

        Ok(CompactionResult {
            key: key.clone(),
            segment_index,
            summarized_records: input.to_summarize.len(),
            retained_records: input.to_retain.len(),
        })
    }

    /// One full orchestration cycle: find a candidate, stage it, execute.
    ///
    /// Returns `Ok(None)` when no entry is over threshold. On summarizer
    /// failure the candidate stays staged; the error carries the key.
    pub async fn run_cycle(
        &self,
        save: &SaveId,
        summarizer: &dyn Summarizer,
    ) -> Result<Option<CompactionResult>, CompactionError> {
        let Some(key) = self.find_candidate(save) else {
            return Ok(None);
        };
        self.stage(save, &key)?;
        self.execute(save, &key, summarizer).await.map(Some)
    }

    /// Size an entry's compaction without mutating anything.
    ///
    /// Calls the summarizer to obtain a realistic post-compaction size
    /// but never writes: no staging, no segment append, no reconciler
    /// traffic.
    pub async fn preview(
        &self,
        save: &SaveId,
        key: &EntryKey,
        summarizer: &dyn Summarizer,
    ) -> Result<CompactionPreview, CompactionError> {
        let entry = self
            .repository
            .get(save, key)
            .ok_or_else(|| CompactionError::EntryNotFound { key: key.clone() })?;

        let input = self.input_for(&entry);
        if input.is_empty() {
            return Err(CompactionError::EmptyInput { key: key.clone() });
        }

        let request = SummaryRequest {
            text: encode_records(&input.to_summarize),
            prior_context: if entry.segments.is_empty() {
                None
            } else {
                Some(combine_segments(&entry.segments, DEFAULT_SEGMENT_SEPARATOR))
            },
        };
        let raw = self.call_summarizer(key, summarizer, &request).await?;
        let summary = extract_result(&raw);

        Ok(CompactionPreview {
            key: key.clone(),
            units_before: estimate(&encode_records(&entry.raw_region)),
            units_after: estimate(&summary) + estimate(&encode_records(&input.to_retain)),
            summarized_records: input.to_summarize.len(),
            retained_records: input.to_retain.len(),
            first_compaction: entry.segments.is_empty(),
        })
    }

    // ─── Private helpers ─────────────────────────────────────────────────

    /// Run the summarizer under the configured timeout. Failures and
    /// timeouts both surface as `SummarizerFailed`; the caller's entry
    /// state is untouched either way.
    async fn call_summarizer(
        &self,
        key: &EntryKey,
        summarizer: &dyn Summarizer,
        request: &SummaryRequest,
    ) -> Result<String, CompactionError> {
        match timeout(self.summarizer_timeout, summarizer.summarize(request)).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(err)) => {
                warn!(key = %key, %err, "summarizer call failed");
                Err(CompactionError::SummarizerFailed {
                    key: key.clone(),
                    message: err.to_string(),
                })
            }
            Err(_) => {
                warn!(
                    key = %key,
                    timeout_secs = self.summarizer_timeout.as_secs(),
                    "summarizer call timed out"
                );
                Err(CompactionError::SummarizerFailed {
                    key: key.clone(),
                    message: format!(
                        "timed out after {}s",
                        self.summarizer_timeout.as_secs()
                    ),
                })
            }
        }
    }
}
