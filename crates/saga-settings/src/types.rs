//! Settings types.
//!
//! All serializable types use `camelCase` for wire compatibility.

use serde::{Deserialize, Serialize};

use saga_core::EntryKind;

/// Per-kind compaction thresholds, in estimator units.
///
/// A compaction becomes a candidate when the estimated size of the
/// compactable prefix (raw region minus the retention window) exceeds
/// the kind's threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSettings {
    /// Dialogue logs.
    pub dialogue: u32,
    /// Battle logs.
    pub battle: u32,
    /// Per-subject training logs.
    pub training: u32,
    /// Conquest logs.
    pub conquest: u32,
    /// Global event stream.
    pub event: u32,
    /// Derived resource status.
    pub resource_status: u32,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            dialogue: 1_500,
            battle: 1_200,
            training: 1_200,
            conquest: 800,
            event: 800,
            resource_status: 600,
        }
    }
}

impl ThresholdSettings {
    /// Threshold for one entry kind.
    #[must_use]
    pub fn for_kind(&self, kind: EntryKind) -> u32 {
        match kind {
            EntryKind::Dialogue => self.dialogue,
            EntryKind::Battle => self.battle,
            EntryKind::Training => self.training,
            EntryKind::Conquest => self.conquest,
            EntryKind::Event => self.event,
            EntryKind::ResourceStatus => self.resource_status,
        }
    }

    /// Set every kind to the same threshold.
    pub fn set_all(&mut self, threshold: u32) {
        self.dialogue = threshold;
        self.battle = threshold;
        self.training = threshold;
        self.conquest = threshold;
        self.event = threshold;
        self.resource_status = threshold;
    }
}

/// Top-level settings for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagaSettings {
    /// Minimum log level when `RUST_LOG` is unset.
    pub log_level: String,
    /// Rounds kept verbatim during compaction (one round = request plus
    /// response, two records).
    pub retain_rounds: u32,
    /// Seconds before an in-flight summarizer call is abandoned.
    pub summarizer_timeout_secs: u64,
    /// Per-kind compaction thresholds.
    pub thresholds: ThresholdSettings,
}

impl Default for SagaSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            retain_rounds: 5,
            summarizer_timeout_secs: 120,
            thresholds: ThresholdSettings::default(),
        }
    }
}
