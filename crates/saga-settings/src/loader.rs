//! Settings loading.
//!
//! Three layers, lowest to highest priority: compiled defaults, the
//! user's JSON settings file (deep-merged over the defaults), then
//! `SAGA_*` environment variables.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::SagaSettings;

/// Resolve the path to the settings file (`~/.saga/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".saga").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<SagaSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from `path`, then apply env var overrides.
///
/// A missing file is not an error (defaults apply); a file that fails
/// to parse is.
pub fn load_settings_from_path(path: &Path) -> Result<SagaSettings> {
    let defaults = serde_json::to_value(SagaSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: SagaSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Merge `source` onto `target`.
///
/// Objects merge key by key, recursing. Anything else in `source`
/// (arrays included) replaces the target value outright, except `null`,
/// which leaves the target value alone.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides (highest priority).
///
/// - `SAGA_LOG_LEVEL` — log level
/// - `SAGA_RETAIN_ROUNDS` — retention window in rounds
/// - `SAGA_THRESHOLD` — one threshold applied to every entry kind
fn apply_env_overrides(settings: &mut SagaSettings) {
    if let Ok(level) = std::env::var("SAGA_LOG_LEVEL") {
        settings.log_level = level;
    }
    if let Ok(raw) = std::env::var("SAGA_RETAIN_ROUNDS") {
        match raw.parse::<u32>() {
            Ok(rounds) => settings.retain_rounds = rounds,
            Err(_) => warn!(raw, "SAGA_RETAIN_ROUNDS is not a number, ignoring"),
        }
    }
    if let Ok(raw) = std::env::var("SAGA_THRESHOLD") {
        match raw.parse::<u32>() {
            Ok(threshold) => settings.thresholds.set_all(threshold),
            Err(_) => warn!(raw, "SAGA_THRESHOLD is not a number, ignoring"),
        }
    }
}
