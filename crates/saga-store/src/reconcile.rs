//! Dual-store reconciliation.
//!
//! The durable store is authoritative: [`merge`] seeds from durable
//! records and admits generation records only when their identity key is
//! new. The identity key is `(occurredAt, sender-or-empty, first 100
//! chars of content)` — sort keys differ between projections and never
//! participate in identity.
//!
//! Side-channel data (unconfirmed rounds, pending attribute deltas,
//! pre-compaction snapshots) lives in dedicated durable stores and is
//! flushed into the committed stores before any compaction commits, so
//! nothing pending is lost when raw records are folded away. Side-channel
//! writes are fail-silent: a broken durable store must not block the
//! primary compaction flow.
//!
//! Records folded into a summary segment are marked in the
//! `folded_records` store; [`Reconciler::adopt`] withholds marked records
//! from the generation view so a save activation never re-inflates a raw
//! region with content a segment already captures. The durable history
//! itself keeps every record.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use saga_core::{Record, SaveId, SubjectId};

use crate::durable::DurableStore;

/// Committed per-subject record lists.
pub const SUBJECT_HISTORY_STORE: &str = "subject_history";
/// Unconfirmed request/response rounds awaiting a commit.
pub const PENDING_ROUNDS_STORE: &str = "pending_rounds";
/// Unconfirmed attribute deltas awaiting a commit.
pub const PENDING_DELTAS_STORE: &str = "pending_attribute_deltas";
/// Committed attribute deltas.
pub const ATTRIBUTE_DELTAS_STORE: &str = "attribute_deltas";
/// Pre-compaction subject snapshots.
pub const SUBJECT_SNAPSHOTS_STORE: &str = "subject_snapshots";
/// Identity keys of records already folded into summary segments.
pub const FOLDED_RECORDS_STORE: &str = "folded_records";

/// Number of content characters participating in the record identity key.
const DEDUP_CONTENT_CHARS: usize = 100;

type RecordKey = (String, String, String);

fn dedup_key(record: &Record) -> RecordKey {
    (
        record.occurred_at.clone(),
        record.sender.clone().unwrap_or_default(),
        record.content.chars().take(DEDUP_CONTENT_CHARS).collect(),
    )
}

/// Merge durable and generation views of one subject's records.
///
/// Durable records are seeded first; generation records are added only if
/// their identity key is not already present. The result is sorted by
/// `sort_key` ascending. Idempotent: re-merging the same inputs never
/// duplicates a record.
#[must_use]
pub fn merge(durable: &[Record], generation: &[Record]) -> Vec<Record> {
    let mut seen: HashSet<RecordKey> = HashSet::new();
    let mut merged: Vec<Record> = Vec::with_capacity(durable.len() + generation.len());

    for record in durable.iter().chain(generation) {
        if seen.insert(dedup_key(record)) {
            merged.push(record.clone());
        }
    }

    merged.sort_by_key(|r| r.sort_key);
    merged
}

/// Keeps the durable store in step with the generation view.
pub struct Reconciler<D: DurableStore> {
    durable: D,
}

impl<D: DurableStore> Reconciler<D> {
    /// Wrap a durable store.
    pub fn new(durable: D) -> Self {
        Self { durable }
    }

    /// Access the underlying durable store.
    pub fn durable(&self) -> &D {
        &self.durable
    }

    fn subject_key(save: &SaveId, subject: &SubjectId) -> String {
        format!("{save}/{subject}")
    }

    /// The committed durable record list for a subject. Absent or
    /// unreadable data reads as empty.
    pub fn history(&self, save: &SaveId, subject: &SubjectId) -> Vec<Record> {
        self.read_records(SUBJECT_HISTORY_STORE, &Self::subject_key(save, subject))
    }

    /// Merge freshly appended records into the durable history.
    ///
    /// Called on every generation-view append so the durable projection
    /// never falls behind. Fail-silent.
    pub fn sync_on_append(&self, save: &SaveId, subject: &SubjectId, records: &[Record]) {
        let key = Self::subject_key(save, subject);
        let merged = merge(&self.read_records(SUBJECT_HISTORY_STORE, &key), records);
        self.write_records(SUBJECT_HISTORY_STORE, &key, &merged);
    }

    /// Merge both projections on a save-slot switch and persist the
    /// union as the new durable history.
    ///
    /// Returns the merged list minus any records already folded into a
    /// summary segment, so the caller can use it directly as the new raw
    /// region. The durable history itself keeps the folded records.
    pub fn adopt(
        &self,
        save: &SaveId,
        subject: &SubjectId,
        generation_records: &[Record],
    ) -> Vec<Record> {
        let key = Self::subject_key(save, subject);
        let merged = merge(
            &self.read_records(SUBJECT_HISTORY_STORE, &key),
            generation_records,
        );
        self.write_records(SUBJECT_HISTORY_STORE, &key, &merged);

        let folded = self.read_folded(&key);
        if folded.is_empty() {
            return merged;
        }
        merged
            .into_iter()
            .filter(|r| !folded.contains(&dedup_key(r)))
            .collect()
    }

    /// Mark records as folded into a summary segment, so that save
    /// activation never adopts them back into a raw region. Fail-silent.
    pub fn mark_folded(&self, save: &SaveId, subject: &SubjectId, records: &[Record]) {
        if records.is_empty() {
            return;
        }
        let key = Self::subject_key(save, subject);
        let mut folded = self.read_folded(&key);
        for record in records {
            let _ = folded.insert(dedup_key(record));
        }
        let ordered: Vec<RecordKey> = folded.into_iter().collect();
        match serde_json::to_value(&ordered) {
            Ok(value) => {
                if let Err(err) = self.durable.put(FOLDED_RECORDS_STORE, &key, value) {
                    warn!(%err, key, "failed to persist folded record keys");
                }
            }
            Err(err) => warn!(%err, key, "folded record keys not serializable"),
        }
    }

    /// Stash unconfirmed request/response rounds for a subject.
    pub fn stash_pending_rounds(&self, save: &SaveId, subject: &SubjectId, records: &[Record]) {
        let key = Self::subject_key(save, subject);
        let merged = merge(&self.read_records(PENDING_ROUNDS_STORE, &key), records);
        self.write_records(PENDING_ROUNDS_STORE, &key, &merged);
    }

    /// Stash an unconfirmed attribute delta for a subject.
    pub fn stash_attribute_delta(&self, save: &SaveId, subject: &SubjectId, delta: Value) {
        let key = Self::subject_key(save, subject);
        let mut deltas = match self.durable.get(PENDING_DELTAS_STORE, &key) {
            Ok(Some(Value::Array(existing))) => existing,
            Ok(_) => Vec::new(),
            Err(err) => {
                warn!(%err, key, "failed to read pending deltas, starting fresh");
                Vec::new()
            }
        };
        deltas.push(delta);
        if let Err(err) = self
            .durable
            .put(PENDING_DELTAS_STORE, &key, Value::Array(deltas))
        {
            warn!(%err, key, "failed to stash attribute delta");
        }
    }

    /// Record a pre-compaction snapshot of a subject (last write wins).
    pub fn record_snapshot(&self, save: &SaveId, subject: &SubjectId, snapshot: Value) {
        let key = Self::subject_key(save, subject);
        if let Err(err) = self.durable.put(SUBJECT_SNAPSHOTS_STORE, &key, snapshot) {
            warn!(%err, key, "failed to record subject snapshot");
        }
    }

    /// Flush every pending side-channel item for a subject into its
    /// committed store, then clear the pending keys.
    ///
    /// Called synchronously before a compaction commits so that nothing
    /// pending is lost when the raw records are folded into a segment.
    /// Fail-silent: a broken durable store never blocks the compaction.
    pub fn flush_pending(&self, save: &SaveId, subject: &SubjectId) {
        let key = Self::subject_key(save, subject);

        // Pending rounds fold into the committed history.
        let pending = self.read_records(PENDING_ROUNDS_STORE, &key);
        if !pending.is_empty() {
            debug!(key, count = pending.len(), "flushing pending rounds");
            let merged = merge(&self.read_records(SUBJECT_HISTORY_STORE, &key), &pending);
            self.write_records(SUBJECT_HISTORY_STORE, &key, &merged);
            if let Err(err) = self.durable.delete(PENDING_ROUNDS_STORE, &key) {
                warn!(%err, key, "failed to clear pending rounds");
            }
        }

        // Pending deltas append onto the committed delta list.
        match self.durable.get(PENDING_DELTAS_STORE, &key) {
            Ok(Some(Value::Array(pending_deltas))) if !pending_deltas.is_empty() => {
                let mut committed = match self.durable.get(ATTRIBUTE_DELTAS_STORE, &key) {
                    Ok(Some(Value::Array(existing))) => existing,
                    _ => Vec::new(),
                };
                committed.extend(pending_deltas);
                if let Err(err) =
                    self.durable
                        .put(ATTRIBUTE_DELTAS_STORE, &key, Value::Array(committed))
                {
                    warn!(%err, key, "failed to commit attribute deltas");
                } else if let Err(err) = self.durable.delete(PENDING_DELTAS_STORE, &key) {
                    warn!(%err, key, "failed to clear pending deltas");
                }
            }
            Ok(_) => {}
            Err(err) => warn!(%err, key, "failed to read pending deltas during flush"),
        }
    }

    /// Remove every durable row for a subject (subject left play).
    pub fn purge_subject(&self, save: &SaveId, subject: &SubjectId) {
        let key = Self::subject_key(save, subject);
        for store in [
            SUBJECT_HISTORY_STORE,
            PENDING_ROUNDS_STORE,
            PENDING_DELTAS_STORE,
            ATTRIBUTE_DELTAS_STORE,
            SUBJECT_SNAPSHOTS_STORE,
            FOLDED_RECORDS_STORE,
        ] {
            if let Err(err) = self.durable.delete(store, &key) {
                warn!(%err, store, key, "failed to purge durable row");
            }
        }
    }

    // ─── Private helpers ─────────────────────────────────────────────────

    fn read_folded(&self, key: &str) -> HashSet<RecordKey> {
        match self.durable.get(FOLDED_RECORDS_STORE, key) {
            Ok(Some(value)) => match serde_json::from_value::<Vec<RecordKey>>(value) {
                Ok(keys) => keys.into_iter().collect(),
                Err(err) => {
                    warn!(%err, key, "unreadable folded record keys, treating as empty");
                    HashSet::new()
                }
            },
            Ok(None) => HashSet::new(),
            Err(err) => {
                warn!(%err, key, "durable read failed, treating as empty");
                HashSet::new()
            }
        }
    }

    fn read_records(&self, store: &str, key: &str) -> Vec<Record> {
        match self.durable.get(store, key) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(records) => records,
                Err(err) => {
                    warn!(%err, store, key, "unreadable record list, treating as empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(%err, store, key, "durable read failed, treating as empty");
                Vec::new()
            }
        }
    }

    fn write_records(&self, store: &str, key: &str, records: &[Record]) {
        match serde_json::to_value(records) {
            Ok(value) => {
                if let Err(err) = self.durable.put(store, key, value) {
                    warn!(%err, store, key, "durable write failed");
                }
            }
            Err(err) => warn!(%err, store, key, "record list not serializable"),
        }
    }
}
