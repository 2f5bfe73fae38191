//! Single-line record codec for the flat state files.
//!
//! # Record Format
//!
//! Every entry is one line of three comma-separated fields:
//!
//! ```text
//! /Users/me/Downloads,/Users/me/Archive,24          # DirectoryEntry
//! /Users/me/Downloads/a.zip,2024-01-01T00:00:00Z,false   # FileEntry
//! ```
//!
//! The first comma ends the first field and the last comma starts the third,
//! so the middle field (destination path or timestamp) may itself contain
//! commas. The first field may not.
//!
//! Blank lines and `#` comments are filtered by [`super::flat_file`] and never
//! reach this module.

use thiserror::Error;

use super::types::{DirectoryEntry, FileEntry};

/// Why a line could not be turned into an entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected 3 fields, found {found}")]
    TooFewFields { found: usize },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("invalid age threshold {0:?}: expected a non-negative integer")]
    InvalidHours(String),

    #[error("invalid ignore flag {0:?}: expected true or false")]
    InvalidIgnore(String),

    #[error("{field} must not contain a comma")]
    CommaInField { field: &'static str },

    #[error("{field} must not contain a line break")]
    LineBreakInField { field: &'static str },
}

/// An entry that can be stored as one line of a state file.
pub trait Record: Sized {
    /// Human-readable name used in log messages.
    const KIND: &'static str;

    /// Check that [`Record::encode`] output decodes back to `self`.
    ///
    /// Call before putting an entry into a collection that will be saved.
    fn validate(&self) -> Result<(), CodecError>;

    fn encode(&self) -> String;

    fn decode(line: &str) -> Result<Self, CodecError>;
}

/// Split a line into exactly three fields, letting the middle one absorb
/// extra commas.
fn split_fields(line: &str) -> Result<(&str, &str, &str), CodecError> {
    let (first, rest) = line
        .split_once(',')
        .ok_or(CodecError::TooFewFields { found: 1 })?;
    let (middle, last) = rest
        .rsplit_once(',')
        .ok_or(CodecError::TooFewFields { found: 2 })?;
    Ok((first, middle, last))
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str, CodecError> {
    if value.is_empty() {
        Err(CodecError::EmptyField { field })
    } else {
        Ok(value)
    }
}

fn single_line(value: &str, field: &'static str) -> Result<(), CodecError> {
    if value.contains(['\n', '\r']) {
        Err(CodecError::LineBreakInField { field })
    } else {
        Ok(())
    }
}

/// The first field ends at the first comma, so it may not hold one.
fn leading_field(value: &str, field: &'static str) -> Result<(), CodecError> {
    non_empty(value, field)?;
    single_line(value, field)?;
    if value.contains(',') {
        return Err(CodecError::CommaInField { field });
    }
    Ok(())
}

impl Record for DirectoryEntry {
    const KIND: &'static str = "directory entry";

    fn validate(&self) -> Result<(), CodecError> {
        leading_field(&self.watch_path, "watch path")?;
        non_empty(&self.destination_path, "destination path")?;
        single_line(&self.destination_path, "destination path")
    }

    fn encode(&self) -> String {
        format!(
            "{},{},{}",
            self.watch_path, self.destination_path, self.age_threshold_hours
        )
    }

    fn decode(line: &str) -> Result<Self, CodecError> {
        let (watch, destination, hours) = split_fields(line)?;
        let watch_path = non_empty(watch, "watch path")?;
        let destination_path = non_empty(destination, "destination path")?;
        // u64 parsing rejects a leading '-', so negative thresholds fail here too
        let age_threshold_hours = hours
            .trim()
            .parse::<u64>()
            .map_err(|_| CodecError::InvalidHours(hours.to_string()))?;

        Ok(DirectoryEntry::new(
            watch_path,
            destination_path,
            age_threshold_hours,
        ))
    }
}

impl Record for FileEntry {
    const KIND: &'static str = "file entry";

    fn validate(&self) -> Result<(), CodecError> {
        leading_field(&self.path, "path")?;
        single_line(&self.last_checked_timestamp, "timestamp")
    }

    fn encode(&self) -> String {
        format!("{},{},{}", self.path, self.last_checked_timestamp, self.ignore)
    }

    fn decode(line: &str) -> Result<Self, CodecError> {
        let (path, timestamp, ignore) = split_fields(line)?;
        let path = non_empty(path, "path")?;
        let ignore = match ignore.trim() {
            "true" => true,
            "false" => false,
            other => return Err(CodecError::InvalidIgnore(other.to_string())),
        };

        Ok(FileEntry::new(path, timestamp, ignore))
    }
}

// ============================================================================
// TESTS
// ============================================================================
