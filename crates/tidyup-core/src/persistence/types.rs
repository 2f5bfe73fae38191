//! Persistence data types.
//!
//! # Data Model Overview
//!
//! TidyUp persists its state in a handful of files under the app data
//! directory:
//!
//! ```text
//! ~/Library/Application Support/TidyUp/   (or platform equivalent)
//! ├── tidyupwatchlist    # Watched directories, one record per line
//! ├── tidyupfilelist     # Tracked files, one record per line
//! └── settings.json      # User preferences
//! ```
//!
//! The two list files share the flat-file record format described in
//! [`super::codec`]. Settings are plain JSON.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Entry Types
// ============================================================================

/// A watched directory and where its aged-out files go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// Absolute path being monitored. Unique within the watch list.
    pub watch_path: String,

    /// Absolute path files are moved to once they age out.
    pub destination_path: String,

    /// Files older than this many hours are eligible for tidying.
    pub age_threshold_hours: u64,
}

impl DirectoryEntry {
    pub fn new(
        watch_path: impl Into<String>,
        destination_path: impl Into<String>,
        age_threshold_hours: u64,
    ) -> Self {
        Self {
            watch_path: watch_path.into(),
            destination_path: destination_path.into(),
            age_threshold_hours,
        }
    }
}

/// A file that has been seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Absolute path of the tracked file.
    pub path: String,

    /// When the file was last evaluated. Opaque to the core.
    pub last_checked_timestamp: String,

    /// Permanently excluded from tidying.
    pub ignore: bool,
}

impl FileEntry {
    pub fn new(
        path: impl Into<String>,
        last_checked_timestamp: impl Into<String>,
        ignore: bool,
    ) -> Self {
        Self {
            path: path.into(),
            last_checked_timestamp: last_checked_timestamp.into(),
            ignore,
        }
    }
}

/// Current UTC time in the format TidyUp writes for `last_checked_timestamp`.
///
/// e.g. `2024-01-01T00:00:00Z`
pub fn check_timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ============================================================================
// Tracked State
// ============================================================================

/// Both persisted collections, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedState {
    pub file_entries: Vec<FileEntry>,
    pub directory_entries: Vec<DirectoryEntry>,
}

impl TrackedState {
    pub fn is_empty(&self) -> bool {
        self.file_entries.is_empty() && self.directory_entries.is_empty()
    }

    // ---- watch list -------------------------------------------------------

    /// Find a watched directory by its watch path.
    pub fn find_directory(&self, watch_path: &str) -> Option<&DirectoryEntry> {
        self.directory_entries
            .iter()
            .find(|d| d.watch_path == watch_path)
    }

    /// Add a watched directory, or replace the one with the same watch path.
    ///
    /// A replaced entry keeps its position in the list. Returns `true` if an
    /// existing entry was replaced.
    pub fn upsert_directory(&mut self, entry: DirectoryEntry) -> bool {
        match self
            .directory_entries
            .iter_mut()
            .find(|d| d.watch_path == entry.watch_path)
        {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => {
                self.directory_entries.push(entry);
                false
            }
        }
    }

    /// Stop watching a directory. Returns the removed entry, if any.
    pub fn remove_directory(&mut self, watch_path: &str) -> Option<DirectoryEntry> {
        let index = self
            .directory_entries
            .iter()
            .position(|d| d.watch_path == watch_path)?;
        Some(self.directory_entries.remove(index))
    }

    /// Change the age threshold of a watched directory.
    ///
    /// Returns `false` if no directory with that watch path is watched.
    pub fn set_age_threshold(&mut self, watch_path: &str, hours: u64) -> bool {
        match self
            .directory_entries
            .iter_mut()
            .find(|d| d.watch_path == watch_path)
        {
            Some(entry) => {
                entry.age_threshold_hours = hours;
                true
            }
            None => false,
        }
    }

    /// Watch paths that appear more than once, in first-seen order.
    ///
    /// The flat-file format cannot prevent duplicates, so a hand-edited
    /// watch list may contain them.
    pub fn duplicate_watch_paths(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for entry in &self.directory_entries {
            let path = entry.watch_path.as_str();
            if !seen.insert(path) && !duplicates.contains(&path) {
                duplicates.push(path);
            }
        }
        duplicates
    }

    // ---- file list --------------------------------------------------------

    /// Find a tracked file by path.
    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        self.file_entries.iter().find(|f| f.path == path)
    }

    /// Record that a file was evaluated at `timestamp`.
    ///
    /// Creates the entry on first sight; the `ignore` flag of an existing
    /// entry is left untouched.
    pub fn record_file_check(&mut self, path: &str, timestamp: impl Into<String>) {
        let timestamp = timestamp.into();
        match self.file_entries.iter_mut().find(|f| f.path == path) {
            Some(entry) => entry.last_checked_timestamp = timestamp,
            None => self.file_entries.push(FileEntry::new(path, timestamp, false)),
        }
    }

    /// Mark a tracked file as ignored (or not).
    ///
    /// Returns `false` if the file is not tracked.
    pub fn set_file_ignored(&mut self, path: &str, ignore: bool) -> bool {
        match self.file_entries.iter_mut().find(|f| f.path == path) {
            Some(entry) => {
                entry.ignore = ignore;
                true
            }
            None => false,
        }
    }

    /// Forget a tracked file. Returns the removed entry, if any.
    pub fn remove_file(&mut self, path: &str) -> Option<FileEntry> {
        let index = self.file_entries.iter().position(|f| f.path == path)?;
        Some(self.file_entries.remove(index))
    }
}

// ============================================================================
// Settings
// ============================================================================

/// User preferences stored in `settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Launch TidyUp when the user logs in.
    #[serde(default)]
    pub start_on_login: bool,
}

// ============================================================================
// TESTS
// ============================================================================
