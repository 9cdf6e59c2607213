//! The settings collaborator: week-start convention, seen milestones, and
//! the task capacity mode, persisted as one JSON document.

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tally_core::task::CapacityMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// `"monday"` or `"sunday"`.
    pub week_start: String,
    pub seen_milestones: Vec<String>,
    pub capacity_calculation: CapacityMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            week_start: "monday".into(),
            seen_milestones: Vec::new(),
            capacity_calculation: CapacityMode::default(),
        }
    }
}

/// Loads settings from `path`. A missing file means first run; an unreadable
/// or corrupt file degrades to defaults with a warning rather than blocking
/// the caller (re-firing a one-time milestone beats failing a toggle).
pub fn load(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to read settings, using defaults");
            return Settings::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to parse settings, using defaults");
            Settings::default()
        }
    }
}

pub fn save(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let raw = serde_json::to_string_pretty(settings)?;
    fs::write(path, raw)?;
    Ok(())
}
