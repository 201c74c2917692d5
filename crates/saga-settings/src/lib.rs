//! # saga-settings
//!
//! Process-wide configuration: per-kind compaction thresholds, the
//! retention window, and logging.
//!
//! Loading flow:
//! 1. Start with compiled [`SagaSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{SagaSettings, ThresholdSettings};
