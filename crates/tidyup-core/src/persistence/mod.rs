//! Persistence layer for the watch list, file list, and settings.
//!
//! # Overview
//!
//! This module handles all file I/O for TidyUp's persistent state:
//!
//! - **Codec** - One entry <-> one comma-separated line
//! - **Flat files** - Whole collections as line-oriented text files
//! - **State** - Loading and saving both collections as a pair
//! - **Settings** - User preferences as JSON
//!
//! # File Locations
//!
//! All data lives under the app data directory (see [`crate::config`]):
//!
//! ```text
//! <data dir>/
//! ├── tidyupwatchlist    # watchPath,destinationPath,hours
//! ├── tidyupfilelist     # path,lastChecked,ignore
//! └── settings.json
//! ```
//!
//! # Design Principles
//!
//! ## Atomic Writes
//!
//! All save operations use write-then-rename to prevent corruption:
//!
//! 1. Write to `file.tmp`
//! 2. Rename to `file` (atomic on Unix)
//!
//! ## Partial-Failure Tolerance
//!
//! A malformed line drops that one record. An unreadable file empties that
//! one collection at startup. Neither stops the process.

pub mod codec;
pub mod flat_file;
pub mod settings;
pub mod state;
pub mod types;

// Re-export commonly used items for convenience
pub use codec::{CodecError, Record};
pub use flat_file::{load_lines, read_lines, write_lines, StoreError};
pub use settings::{load_settings, save_settings, SettingsError};
pub use state::{
    initialize, load_state, persist, save_state, Collection, Initialized, LoadedState, StateError,
};
pub use types::*;
