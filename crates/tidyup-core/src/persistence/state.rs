//! Loading and saving the watch list and file list together.
//!
//! # Overview
//!
//! The two collections live in separate flat files (see [`super::flat_file`])
//! and are always loaded and saved as a pair. This module owns the startup
//! policy:
//!
//! - A missing file means "nothing stored yet", not an error.
//! - A malformed line is skipped; the rest of the file still loads.
//! - If neither file existed, an empty pair is written immediately so the
//!   next start finds an initialized installation.
//!
//! # Usage
//!
//! ```ignore
//! use tidyup_core::persistence::{initialize, persist};
//!
//! let mut init = initialize(&file_list, &watch_list);
//! init.state.record_file_check("/Users/me/Downloads/a.zip", "2024-01-01T00:00:00Z");
//! persist(&file_list, &watch_list, &init.state)?;
//! ```

use std::fmt;
use std::path::Path;

use thiserror::Error;

use super::codec::Record;
use super::flat_file::{read_lines, write_lines, StoreError};
use super::types::TrackedState;

/// Which of the two collections an operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    FileEntries,
    DirectoryEntries,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::FileEntries => write!(f, "file list"),
            Collection::DirectoryEntries => write!(f, "watch list"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to load {collection}: {source}")]
    Load {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    #[error("Failed to persist {}", describe_failures(.failures))]
    Persist {
        failures: Vec<(Collection, StoreError)>,
    },
}

fn describe_failures(failures: &[(Collection, StoreError)]) -> String {
    failures
        .iter()
        .map(|(collection, err)| format!("{collection} ({err})"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl StateError {
    /// Collections that failed in this operation.
    pub fn collections(&self) -> Vec<Collection> {
        match self {
            StateError::Load { collection, .. } => vec![*collection],
            StateError::Persist { failures } => failures.iter().map(|(c, _)| *c).collect(),
        }
    }
}

/// Result of reading both state files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedState {
    /// At least one of the two state files existed.
    pub had_prior_state: bool,
    pub state: TrackedState,
}

/// Result of [`initialize`]. Never blocks startup.
#[derive(Debug)]
pub struct Initialized {
    pub had_prior_state: bool,
    pub state: TrackedState,
    /// Load or first-run persist failures. The affected collections start
    /// empty.
    pub errors: Vec<StateError>,
}

/// Load one collection. `Ok(None)` means the file does not exist.
fn load_collection<T: Record>(
    path: &Path,
    collection: Collection,
) -> Result<Option<Vec<T>>, StateError> {
    let lines = match read_lines(path) {
        Ok(Some(lines)) => lines,
        Ok(None) => {
            log::debug!("No {} at {}", collection, path.display());
            return Ok(None);
        }
        Err(source) => return Err(StateError::Load { collection, source }),
    };

    let mut entries = Vec::with_capacity(lines.len());
    for line in &lines {
        match T::decode(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => log::warn!(
                "Skipping malformed {} in {}: {} ({:?})",
                T::KIND,
                path.display(),
                e,
                line
            ),
        }
    }

    log::debug!(
        "Loaded {} {}(s) from {}",
        entries.len(),
        T::KIND,
        path.display()
    );
    Ok(Some(entries))
}

fn save_collection<T: Record>(path: &Path, entries: &[T]) -> Result<(), StoreError> {
    write_lines(path, entries.iter().map(Record::encode))
}

/// Load both collections.
///
/// Fails on the first I/O error other than a missing file.
pub fn load_state(
    file_entry_path: &Path,
    directory_entry_path: &Path,
) -> Result<LoadedState, StateError> {
    let files = load_collection(file_entry_path, Collection::FileEntries)?;
    let directories = load_collection(directory_entry_path, Collection::DirectoryEntries)?;

    Ok(LoadedState {
        had_prior_state: files.is_some() || directories.is_some(),
        state: TrackedState {
            file_entries: files.unwrap_or_default(),
            directory_entries: directories.unwrap_or_default(),
        },
    })
}

/// Write both collections.
///
/// Both files are always attempted, even if the first write fails. Each write
/// is atomic on its own; the pair is not.
pub fn save_state(
    file_entry_path: &Path,
    directory_entry_path: &Path,
    state: &TrackedState,
) -> Result<(), StateError> {
    let mut failures = Vec::new();

    if let Err(e) = save_collection(file_entry_path, &state.file_entries) {
        failures.push((Collection::FileEntries, e));
    }
    if let Err(e) = save_collection(directory_entry_path, &state.directory_entries) {
        failures.push((Collection::DirectoryEntries, e));
    }

    if failures.is_empty() {
        log::debug!(
            "Saved {} file entries and {} directory entries",
            state.file_entries.len(),
            state.directory_entries.len()
        );
        Ok(())
    } else {
        Err(StateError::Persist { failures })
    }
}

/// Load state at process start.
///
/// Each collection loads independently: if one file is unreadable it starts
/// empty (the error is returned in [`Initialized::errors`]) and the other
/// still loads. An unreadable file counts as prior state, so it is never
/// overwritten with an empty list here.
///
/// If neither file existed, the empty pair is persisted right away.
pub fn initialize(file_entry_path: &Path, directory_entry_path: &Path) -> Initialized {
    let mut errors = Vec::new();
    let mut had_prior_state = false;
    let mut state = TrackedState::default();

    match load_collection(file_entry_path, Collection::FileEntries) {
        Ok(Some(entries)) => {
            had_prior_state = true;
            state.file_entries = entries;
        }
        Ok(None) => {}
        Err(e) => {
            had_prior_state = true;
            errors.push(e);
        }
    }

    match load_collection(directory_entry_path, Collection::DirectoryEntries) {
        Ok(Some(entries)) => {
            had_prior_state = true;
            state.directory_entries = entries;
        }
        Ok(None) => {}
        Err(e) => {
            had_prior_state = true;
            errors.push(e);
        }
    }

    for path in state.duplicate_watch_paths() {
        log::warn!("Watch list contains {} more than once", path);
    }

    if !had_prior_state {
        log::info!("No prior state found, initializing empty state files");
        if let Err(e) = save_state(file_entry_path, directory_entry_path, &state) {
            errors.push(e);
        }
    }

    for e in &errors {
        log::error!("{}", e);
    }

    Initialized {
        had_prior_state,
        state,
        errors,
    }
}

/// Save state after a mutation or at shutdown.
pub fn persist(
    file_entry_path: &Path,
    directory_entry_path: &Path,
    state: &TrackedState,
) -> Result<(), StateError> {
    save_state(file_entry_path, directory_entry_path, state)
}

// ============================================================================
// TESTS
// ============================================================================
