//! Typed entry operations over the generation-facing store.
//!
//! One container per save; at most one entry per `(subject, kind)` key.
//! Duplicate entries found on read (a corruption symptom) are collapsed
//! lowest-uid-wins into a single entry whose one region holds both record
//! sets, and the repair is persisted immediately.
//!
//! Appends and replaces are textual splices on the stored blob: the
//! records are encoded and inserted at the region boundary without
//! decoding or re-serializing anything else in the blob, so segment
//! blocks and regions belonging to other entry kinds are never
//! reformatted.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::warn;

use saga_codec::{
    append_to_region, decode_entry_body, encode_entry_body, encode_records, replace_region_body,
    wrap_region,
};
use saga_core::{Entry, EntryKey, EntryKind, Record, SaveId, SubjectId};

use crate::generation::GenerationStore;
use crate::stored::StoredEntry;

/// Repository of entries for the generation-facing store.
pub struct EntryRepository<G: GenerationStore> {
    store: G,
}

impl<G: GenerationStore> EntryRepository<G> {
    /// Wrap a generation store.
    pub fn new(store: G) -> Self {
        Self { store }
    }

    /// Container name for a save.
    #[must_use]
    pub fn container_name(save: &SaveId) -> String {
        format!("chronicle_{save}")
    }

    /// Access the underlying store.
    pub fn store(&self) -> &G {
        &self.store
    }

    /// Make sure the save's container exists.
    pub fn ensure(&self, save: &SaveId) {
        self.store.ensure_container(&Self::container_name(save));
    }

    /// All entries in a save, decoded.
    pub fn list(&self, save: &SaveId) -> Vec<Entry> {
        self.load(save).iter().map(StoredEntry::to_entry).collect()
    }

    /// Entries currently visible to the generation view.
    pub fn visible(&self, save: &SaveId) -> Vec<Entry> {
        self.load(save)
            .iter()
            .filter(|e| e.enabled)
            .map(StoredEntry::to_entry)
            .collect()
    }

    /// One entry by key, if present.
    pub fn get(&self, save: &SaveId, key: &EntryKey) -> Option<Entry> {
        self.load(save)
            .iter()
            .find(|e| e.key() == *key)
            .map(StoredEntry::to_entry)
    }

    /// All entries of one kind.
    pub fn find_by_kind(&self, save: &SaveId, kind: EntryKind) -> Vec<Entry> {
        self.load(save)
            .iter()
            .filter(|e| e.kind == kind)
            .map(StoredEntry::to_entry)
            .collect()
    }

    /// Insert or update an entry. Stamps `updated_at`.
    pub fn upsert(&self, save: &SaveId, entry: &Entry) {
        let mut entries = self.load(save);
        let mut stored = match entries.iter().find(|e| e.key() == entry.key) {
            Some(existing) => {
                let mut updated = StoredEntry::from_entry(existing.uid, entry);
                updated.created_at = existing.created_at;
                updated
            }
            None => StoredEntry::from_entry(self.store.next_uid(), entry),
        };
        stored.updated_at = Utc::now();
        entries.retain(|e| e.key() != entry.key);
        entries.push(stored);
        self.persist(save, entries);
    }

    /// Remove an entry. Absent keys are a no-op.
    pub fn delete(&self, save: &SaveId, key: &EntryKey) {
        let mut entries = self.load(save);
        entries.retain(|e| e.key() != *key);
        self.persist(save, entries);
    }

    /// Remove every entry belonging to a subject (subject left play).
    pub fn purge_subject(&self, save: &SaveId, subject: &SubjectId) {
        let mut entries = self.load(save);
        entries.retain(|e| e.subject != *subject);
        self.persist(save, entries);
    }

    /// Append records to an entry's raw region.
    ///
    /// The encoded records are spliced in immediately before the region's
    /// closing delimiter; existing segments and unrelated regions in the
    /// blob keep their exact bytes. Creates the entry if absent. Stamps
    /// `updated_at`.
    pub fn append_records(&self, save: &SaveId, key: &EntryKey, records: &[Record]) {
        if records.is_empty() {
            return;
        }
        let encoded = encode_records(records);
        let mut entries = self.load(save);
        match entries.iter_mut().find(|e| e.key() == *key) {
            Some(stored) => {
                stored.content = append_to_region(&stored.content, key.kind, &encoded);
                stored.updated_at = Utc::now();
            }
            None => entries.push(self.fresh_stored(key, &wrap_region(key.kind, &encoded))),
        }
        self.persist(save, entries);
    }

    /// Replace the entry's entire raw region body.
    ///
    /// Used for derived kinds whose record set is recomputed wholesale.
    /// Segments and unrelated regions keep their exact bytes. Creates the
    /// entry if absent. Stamps `updated_at`.
    pub fn replace_records(&self, save: &SaveId, key: &EntryKey, records: &[Record]) {
        let encoded = encode_records(records);
        let mut entries = self.load(save);
        match entries.iter_mut().find(|e| e.key() == *key) {
            Some(stored) => {
                stored.content = replace_region_body(&stored.content, key.kind, &encoded);
                stored.updated_at = Utc::now();
            }
            None => entries.push(self.fresh_stored(key, &wrap_region(key.kind, &encoded))),
        }
        self.persist(save, entries);
    }

    // ─── Private helpers ─────────────────────────────────────────────────

    fn fresh_stored(&self, key: &EntryKey, content: &str) -> StoredEntry {
        let now = Utc::now();
        StoredEntry {
            uid: self.store.next_uid(),
            subject: key.subject.clone(),
            kind: key.kind,
            content: content.to_string(),
            enabled: true,
            staging: saga_core::StagingState::Idle,
            created_at: now,
            updated_at: now,
        }
    }

    /// Load a save's entries, collapsing duplicate keys and persisting
    /// the repair when one was needed.
    fn load(&self, save: &SaveId) -> Vec<StoredEntry> {
        let container = Self::container_name(save);
        let entries = self.store.list(&container);
        let (collapsed, repaired) = collapse_duplicates(entries);
        if repaired {
            self.store.replace_all(&container, collapsed.clone());
        }
        collapsed
    }

    fn persist(&self, save: &SaveId, entries: Vec<StoredEntry>) {
        self.store
            .replace_all(&Self::container_name(save), entries);
    }
}

/// Collapse duplicate entries for one key: the lowest uid is the
/// canonical target. Both blobs are decoded and re-encoded as one entry
/// whose single region holds the canonical records followed by the
/// loser's; segments merge keep-first by index. Concatenating the raw
/// blobs instead would leave two same-kind regions, and only the first
/// would survive the next rewrite.
///
/// Returns the collapsed list and whether anything was collapsed.
fn collapse_duplicates(entries: Vec<StoredEntry>) -> (Vec<StoredEntry>, bool) {
    let mut by_key: HashMap<EntryKey, usize> = HashMap::new();
    let mut out: Vec<StoredEntry> = Vec::new();
    let mut repaired = false;

    for entry in entries {
        match by_key.get(&entry.key()) {
            None => {
                let _ = by_key.insert(entry.key(), out.len());
                out.push(entry);
            }
            Some(&i) => {
                repaired = true;
                let kept = &mut out[i];
                warn!(
                    key = %entry.key(),
                    kept_uid = kept.uid.min(entry.uid),
                    dropped_uid = kept.uid.max(entry.uid),
                    "duplicate entries for one key, collapsing lowest-uid-wins"
                );
                let (early, late) = if entry.uid < kept.uid {
                    (entry, kept.clone())
                } else {
                    (kept.clone(), entry)
                };

                let (mut segments, mut records) = decode_entry_body(&early.content, early.kind);
                let (late_segments, late_records) = decode_entry_body(&late.content, late.kind);
                let indices: HashSet<u32> = segments.iter().map(|s| s.index).collect();
                segments.extend(
                    late_segments
                        .into_iter()
                        .filter(|s| !indices.contains(&s.index)),
                );
                records.extend(late_records);

                kept.content = encode_entry_body(&segments, early.kind, &records);
                kept.uid = early.uid;
                kept.created_at = early.created_at;
                kept.enabled = early.enabled;
                kept.staging = early.staging;
                kept.updated_at = Utc::now();
            }
        }
    }

    (out, repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_core::{EntryKind, StagingState};

    use crate::generation::MemoryGenerationStore;

    fn repo() -> EntryRepository<MemoryGenerationStore> {
        EntryRepository::new(MemoryGenerationStore::new())
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

    // -- get / upsert --

    #[test]
    fn get_absent_entry_is_none() {
        assert!(repo().get(&save(), &dialogue_key()).is_none());
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let repo = repo();
        let mut entry = Entry::new(dialogue_key());
        entry.raw_region.push(rec("Day 1", "hello", 0));
        repo.upsert(&save(), &entry);

        let got = repo.get(&save(), &dialogue_key()).unwrap();
        assert_eq!(got.raw_region, entry.raw_region);
        assert_eq!(got.key, entry.key);
    }

    #[test]
    fn upsert_preserves_uid_and_created_at() {
        let repo = repo();
        let entry = Entry::new(dialogue_key());
        repo.upsert(&save(), &entry);
        let first = repo.store().list(&EntryRepository::<MemoryGenerationStore>::container_name(&save()));

        let mut changed = entry.clone();
        changed.enabled = false;
        repo.upsert(&save(), &changed);
        let second = repo.store().list(&EntryRepository::<MemoryGenerationStore>::container_name(&save()));

        assert_eq!(first[0].uid, second[0].uid);
        assert_eq!(first[0].created_at, second[0].created_at);
        assert!(!second[0].enabled);
    }

    // -- append --

    #[test]
    fn append_creates_entry_when_absent() {
        let repo = repo();
        repo.append_records(&save(), &dialogue_key(), &[rec("Day 1", "hello", 0)]);
        let entry = repo.get(&save(), &dialogue_key()).unwrap();
        assert_eq!(entry.raw_region.len(), 1);
        assert!(entry.enabled);
    }

    #[test]
    fn append_accumulates_in_order() {
        let repo = repo();
        repo.append_records(&save(), &dialogue_key(), &[rec("Day 1", "one", 0)]);
        repo.append_records(&save(), &dialogue_key(), &[rec("Day 2", "two", 1)]);
        let entry = repo.get(&save(), &dialogue_key()).unwrap();
        let contents: Vec<&str> = entry.raw_region.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two"]);
    }

    #[test]
    fn append_leaves_segments_untouched() {
        let repo = repo();
        let mut entry = Entry::new(dialogue_key());
        entry
            .segments
            .push(saga_core::SummarySegment::new(1, "The first week."));
        entry.raw_region.push(rec("Day 8", "onward", 0));
        repo.upsert(&save(), &entry);

        repo.append_records(&save(), &dialogue_key(), &[rec("Day 9", "more", 1)]);
        let got = repo.get(&save(), &dialogue_key()).unwrap();
        assert_eq!(got.segments, entry.segments);
        assert_eq!(got.raw_region.len(), 2);
    }

    #[test]
    fn append_empty_slice_is_noop() {
        let repo = repo();
        repo.append_records(&save(), &dialogue_key(), &[]);
        assert!(repo.get(&save(), &dialogue_key()).is_none());
    }

    // -- replace --

    #[test]
    fn replace_swaps_record_set_wholesale() {
        let repo = repo();
        let key = EntryKey::new("realm", EntryKind::ResourceStatus);
        repo.replace_records(&save(), &key, &[Record::unsent("Day 1", "gold 100", 0)]);
        repo.replace_records(&save(), &key, &[Record::unsent("Day 9", "gold 250", 0)]);
        let entry = repo.get(&save(), &key).unwrap();
        assert_eq!(entry.raw_region.len(), 1);
        assert_eq!(entry.raw_region[0].content, "gold 250");
    }

    // -- find / delete / purge --

    #[test]
    fn find_by_kind_filters() {
        let repo = repo();
        repo.append_records(&save(), &dialogue_key(), &[rec("Day 1", "hi", 0)]);
        repo.append_records(
            &save(),
            &EntryKey::new("Aria", EntryKind::Training),
            &[rec("Day 1", "drill", 0)],
        );
        repo.append_records(
            &save(),
            &EntryKey::new("Bren", EntryKind::Dialogue),
            &[rec("Day 1", "yo", 0)],
        );

        let dialogues = repo.find_by_kind(&save(), EntryKind::Dialogue);
        assert_eq!(dialogues.len(), 2);
    }

    #[test]
    fn delete_removes_only_that_key() {
        let repo = repo();
        repo.append_records(&save(), &dialogue_key(), &[rec("Day 1", "hi", 0)]);
        repo.append_records(
            &save(),
            &EntryKey::new("Aria", EntryKind::Training),
            &[rec("Day 1", "drill", 0)],
        );
        repo.delete(&save(), &dialogue_key());
        assert!(repo.get(&save(), &dialogue_key()).is_none());
        assert_eq!(repo.find_by_kind(&save(), EntryKind::Training).len(), 1);
    }

    #[test]
    fn purge_subject_removes_all_their_entries() {
        let repo = repo();
        repo.append_records(&save(), &dialogue_key(), &[rec("Day 1", "hi", 0)]);
        repo.append_records(
            &save(),
            &EntryKey::new("Aria", EntryKind::Battle),
            &[rec("Day 2", "clash", 0)],
        );
        repo.append_records(
            &save(),
            &EntryKey::new("Bren", EntryKind::Dialogue),
            &[rec("Day 1", "yo", 0)],
        );

        repo.purge_subject(&save(), &SubjectId::from("Aria"));
        assert!(repo.list(&save()).iter().all(|e| e.key.subject.as_str() == "Bren"));
    }

    // -- visibility --

    #[test]
    fn visible_filters_disabled_entries() {
        let repo = repo();
        let mut entry = Entry::new(dialogue_key());
        entry.enabled = false;
        repo.upsert(&save(), &entry);
        assert!(repo.visible(&save()).is_empty());
        assert_eq!(repo.list(&save()).len(), 1);
    }

    // -- duplicate collapse --

    /// Two entries for one key, arriving higher-uid first, with disjoint
    /// event regions.
    fn duplicate_event_store() -> MemoryGenerationStore {
        let store = MemoryGenerationStore::new();
        let container = EntryRepository::<MemoryGenerationStore>::container_name(&save());
        let now = Utc::now();
        let make = |uid: u64, body: &str| StoredEntry {
            uid,
            subject: SubjectId::from("world"),
            kind: EntryKind::Event,
            content: wrap_region(EntryKind::Event, body),
            enabled: true,
            staging: StagingState::Idle,
            created_at: now,
            updated_at: now,
        };
        store.replace_all(
            &container,
            vec![make(200, "[Day 5] : the flood"), make(100, "[Day 1] : the comet")],
        );
        store
    }

    #[test]
    fn duplicate_entries_collapse_to_lowest_uid_into_one_region() {
        let repo = EntryRepository::new(duplicate_event_store());
        let container = EntryRepository::<MemoryGenerationStore>::container_name(&save());
        let key = EntryKey::new("world", EntryKind::Event);
        let entry = repo.get(&save(), &key).unwrap();

        // One entry remains, canonical uid 100, one region holding both
        // record sets with the canonical records first.
        let stored = repo.store().list(&container);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].uid, 100);
        assert_eq!(stored[0].content.matches("<event_log>").count(), 1);
        let contents: Vec<&str> = entry.raw_region.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["the comet", "the flood"]);
    }

    #[test]
    fn collapsed_entry_survives_a_rewrite_with_both_bodies() {
        let repo = EntryRepository::new(duplicate_event_store());
        let key = EntryKey::new("world", EntryKind::Event);
        let entry = repo.get(&save(), &key).unwrap();

        // A read-modify-write (what staging does) must not drop records.
        repo.upsert(&save(), &entry);

        let again = repo.get(&save(), &key).unwrap();
        let contents: Vec<&str> = again.raw_region.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["the comet", "the flood"]);
    }
}
