//! The top-level write-path facade.
//!
//! [`Chronicle`] owns both persistence projections and keeps them
//! reconciled: every dialogue append is mirrored into the durable
//! history, a save switch adopts durable records back into the
//! generation view, and a subject purge clears both sides. Compaction
//! cycles are delegated to a [`CompactionEngine`] borrowing the same
//! stores.
//!
//! The durable history mirrors the dialogue log only; other kinds are
//! generation-local and rebuilt or compacted in place.

use tracing::{debug, info};

use saga_core::{CompactionError, EntryKey, EntryKind, Record, SaveId, SubjectId};
use saga_settings::SagaSettings;
use saga_store::{DurableStore, EntryRepository, GenerationStore, Reconciler};

use crate::engine::CompactionEngine;
use crate::summarizer::Summarizer;
use crate::types::CompactionResult;

/// Facade over one save-slot family of stores.
pub struct Chronicle<G: GenerationStore, D: DurableStore> {
    repository: EntryRepository<G>,
    reconciler: Reconciler<D>,
    settings: SagaSettings,
}

impl<G: GenerationStore, D: DurableStore> Chronicle<G, D> {
    /// Build a chronicle over a generation store and a durable store.
    pub fn new(generation: G, durable: D, settings: SagaSettings) -> Self {
        Self {
            repository: EntryRepository::new(generation),
            reconciler: Reconciler::new(durable),
            settings,
        }
    }

    /// The generation-facing entry repository.
    pub fn repository(&self) -> &EntryRepository<G> {
        &self.repository
    }

    /// The durable-store reconciler.
    pub fn reconciler(&self) -> &Reconciler<D> {
        &self.reconciler
    }

    /// A compaction engine borrowing this chronicle's stores.
    pub fn engine(&self) -> CompactionEngine<'_, G, D> {
        CompactionEngine::new(&self.repository, &self.reconciler, &self.settings)
    }

    /// Append records to an entry, creating it if absent.
    ///
    /// Dialogue appends are mirrored into the durable history in the
    /// same call, so the durable projection never falls behind the
    /// generation view.
    pub fn append(&self, save: &SaveId, key: &EntryKey, records: &[Record]) {
        self.repository.append_records(save, key, records);
        if key.kind == EntryKind::Dialogue {
            self.reconciler.sync_on_append(save, &key.subject, records);
        }
    }

    /// Replace an entry's record set wholesale (derived kinds).
    pub fn replace(&self, save: &SaveId, key: &EntryKey, records: &[Record]) {
        self.repository.replace_records(save, key, records);
    }

    /// Activate a save slot: make sure its container exists, then merge
    /// the durable history of every dialogue entry back into the
    /// generation view. Records already folded into a summary segment are
    /// withheld by the reconciler, so activation never re-inflates a
    /// compacted raw region.
    ///
    /// The merge is idempotent, so re-activating the same save is safe.
    /// Only subjects already present in the generation view are visited:
    /// the durable store is keyed, not scannable, so a subject whose
    /// records exist solely in durable history rejoins the generation
    /// view on the activation after its dialogue entry next exists.
    pub fn activate_save(&self, save: &SaveId) {
        self.repository.ensure(save);
        for entry in self.repository.find_by_kind(save, EntryKind::Dialogue) {
            let merged = self
                .reconciler
                .adopt(save, &entry.key.subject, &entry.raw_region);
            if merged != entry.raw_region {
                debug!(
                    key = %entry.key,
                    adopted = merged.len().saturating_sub(entry.raw_region.len()),
                    "adopted durable records into generation view"
                );
                let mut updated = entry;
                updated.raw_region = merged;
                self.repository.upsert(save, &updated);
            }
        }
        info!(%save, "save activated");
    }

    /// Remove every trace of a subject from both stores.
    pub fn purge_subject(&self, save: &SaveId, subject: &SubjectId) {
        self.repository.purge_subject(save, subject);
        self.reconciler.purge_subject(save, subject);
        info!(%save, %subject, "subject purged");
    }

    /// Run one compaction cycle over this chronicle's stores.
    pub async fn run_compaction_cycle(
        &self,
        save: &SaveId,
        summarizer: &dyn Summarizer,
    ) -> Result<Option<CompactionResult>, CompactionError> {
        self.engine().run_cycle(save, summarizer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    use async_trait::async_trait;

    use saga_store::{MemoryDurableStore, MemoryGenerationStore};

    use crate::types::SummaryRequest;

    struct CannedSummarizer(&'static str);

    #[async_trait]
    impl Summarizer for CannedSummarizer {
        async fn summarize(
            &self,
            _request: &SummaryRequest,
        ) -> Result<String, Box<dyn Error + Send + Sync>> {
            Ok(self.0.to_string())
        }
    }

    fn chronicle() -> Chronicle<MemoryGenerationStore, MemoryDurableStore> {
        Chronicle::new(
            MemoryGenerationStore::new(),
            MemoryDurableStore::new(),
            SagaSettings::default(),
        )
    }

    fn save() -> SaveId {
        SaveId::from("slot-1")
    }

    fn dialogue_key() -> EntryKey {
        EntryKey::new("Aria", EntryKind::Dialogue)
    }

    fn rec(ts: &str, content: &str, key: u64) -> Record {
        Record::new(ts, "Aria", content, key)
    }

    // -- append mirroring --

    #[test]
    fn dialogue_append_mirrors_into_durable_history() {
        let chronicle = chronicle();
        chronicle.append(&save(), &dialogue_key(), &[rec("Day 1", "hello", 0)]);

        let history = chronicle
            .reconciler()
            .history(&save(), &dialogue_key().subject);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "hello");
    }

    #[test]
    fn non_dialogue_append_stays_generation_local() {
        let chronicle = chronicle();
        let key = EntryKey::new("Aria", EntryKind::Battle);
        chronicle.append(&save(), &key, &[rec("Day 1", "clash", 0)]);

        assert!(chronicle
            .reconciler()
            .history(&save(), &key.subject)
            .is_empty());
        assert_eq!(
            chronicle.repository().get(&save(), &key).unwrap().raw_region[0].content,
            "clash"
        );
    }

    // -- save activation --

    #[test]
    fn activate_save_adopts_durable_only_records() {
        let chronicle = chronicle();
        chronicle.append(&save(), &dialogue_key(), &[rec("Day 2", "in both", 2)]);
        // A record that only the durable store knows about.
        chronicle.reconciler().sync_on_append(
            &save(),
            &dialogue_key().subject,
            &[rec("Day 1", "durable only", 1)],
        );

        chronicle.activate_save(&save());

        let entry = chronicle.repository().get(&save(), &dialogue_key()).unwrap();
        let contents: Vec<&str> = entry.raw_region.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["durable only", "in both"]);
    }

    #[tokio::test]
    async fn activation_does_not_resurrect_compacted_records() {
        let mut settings = SagaSettings::default();
        settings.thresholds.set_all(1);
        let chronicle = Chronicle::new(
            MemoryGenerationStore::new(),
            MemoryDurableStore::new(),
            settings,
        );

        let records: Vec<Record> = (0..12)
            .map(|i| rec(&format!("Day {i}"), &format!("line {i}"), i as u64))
            .collect();
        chronicle.append(&save(), &dialogue_key(), &records);
        chronicle
            .run_compaction_cycle(&save(), &CannedSummarizer("<result>Week one.</result>"))
            .await
            .unwrap()
            .unwrap();

        chronicle.activate_save(&save());

        // The folded prefix stays in the segment, not the raw region.
        let entry = chronicle.repository().get(&save(), &dialogue_key()).unwrap();
        assert_eq!(entry.segments.len(), 1);
        assert_eq!(entry.raw_region.len(), 10);
        assert_eq!(entry.raw_region[0].content, "line 2");
        // The full history is still durable.
        assert_eq!(
            chronicle
                .reconciler()
                .history(&save(), &dialogue_key().subject)
                .len(),
            12
        );
    }

    #[test]
    fn activating_twice_does_not_duplicate() {
        let chronicle = chronicle();
        chronicle.append(&save(), &dialogue_key(), &[rec("Day 1", "hello", 0)]);
        chronicle.activate_save(&save());
        chronicle.activate_save(&save());

        let entry = chronicle.repository().get(&save(), &dialogue_key()).unwrap();
        assert_eq!(entry.raw_region.len(), 1);
    }

    // -- purge --

    #[test]
    fn purge_clears_both_stores() {
        let chronicle = chronicle();
        chronicle.append(&save(), &dialogue_key(), &[rec("Day 1", "hello", 0)]);
        chronicle.purge_subject(&save(), &dialogue_key().subject);

        assert!(chronicle.repository().get(&save(), &dialogue_key()).is_none());
        assert!(chronicle
            .reconciler()
            .history(&save(), &dialogue_key().subject)
            .is_empty());
    }

    // -- end to end --

    #[tokio::test]
    async fn compaction_cycle_through_the_facade() {
        let mut settings = SagaSettings::default();
        settings.thresholds.set_all(1);
        let chronicle = Chronicle::new(
            MemoryGenerationStore::new(),
            MemoryDurableStore::new(),
            settings,
        );

        let records: Vec<Record> = (0..12)
            .map(|i| rec(&format!("Day {i}"), &format!("line {i}"), i as u64))
            .collect();
        chronicle.append(&save(), &dialogue_key(), &records);

        let result = chronicle
            .run_compaction_cycle(&save(), &CannedSummarizer("<result>Week one.</result>"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.segment_index, 1);

        let entry = chronicle.repository().get(&save(), &dialogue_key()).unwrap();
        assert_eq!(entry.segments[0].text, "Week one.");
        assert_eq!(entry.raw_region.len(), 10);

        // Nothing was lost: the durable history still holds every record.
        let history = chronicle
            .reconciler()
            .history(&save(), &dialogue_key().subject);
        assert_eq!(history.len(), 12);
    }
}
