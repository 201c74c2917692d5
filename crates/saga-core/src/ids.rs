//! Identity newtypes.
//!
//! Subjects, saves, and entry keys are all plain strings on the wire, but
//! the newtypes keep them from being mixed up at call sites. The save
//! identity in particular is threaded explicitly through every repository
//! and orchestrator call — there is no process-wide "current save".

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::records::EntryKind;

/// Identity of one narrative subject (a character, a location, a global
/// event stream).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl SubjectId {
    /// Borrow the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identity of one save slot.
///
/// Passed explicitly into every store and orchestrator operation so that
/// multiple saves can in principle be operated on side by side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveId(pub String);

impl SaveId {
    /// Borrow the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SaveId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Composite key identifying one entry: subject plus entry kind.
///
/// At most one entry per key exists in a store snapshot; duplicates found
/// on read are collapsed by the repository (lowest uid wins).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryKey {
    /// The subject this entry belongs to.
    pub subject: SubjectId,
    /// The kind of log this entry holds.
    pub kind: EntryKind,
}

impl EntryKey {
    /// Create a key from a subject and kind.
    pub fn new(subject: impl Into<SubjectId>, kind: EntryKind) -> Self {
        Self {
            subject: subject.into(),
            kind,
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subject, self.kind)
    }
}
