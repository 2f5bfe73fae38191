//! User settings persistence.
//!
//! # File Format
//!
//! Stored as `settings.json` in the app data directory:
//!
//! ```json
//! {
//!   "startOnLogin": true
//! }
//! ```
//!
//! Unknown keys are ignored and missing keys take their defaults, so older
//! and newer builds can share the file.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::types::Settings;

const SETTINGS_FILE: &str = "settings.json";

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Save settings to `{dir}/settings.json`.
///
/// Uses the same write-then-rename pattern as the state files.
pub fn save_settings(dir: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let file_path = dir.join(SETTINGS_FILE);
    let temp_path = dir.join(format!("{SETTINGS_FILE}.tmp"));

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, &file_path)?;

    Ok(())
}

/// Load settings from `{dir}/settings.json`.
///
/// Returns defaults if the file doesn't exist. Only an unreadable or
/// unparseable file is an error.
pub fn load_settings(dir: &Path) -> Result<Settings, SettingsError> {
    let file_path = dir.join(SETTINGS_FILE);

    if !file_path.exists() {
        return Ok(Settings::default());
    }

    let contents = fs::read_to_string(&file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

// ============================================================================
// TESTS
// ============================================================================
