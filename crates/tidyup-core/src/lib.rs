//! # tidyup-core
//!
//! Core logic for TidyUp, the background utility that tidies aged files out
//! of watched directories.
//!
//! This crate is UI-agnostic and can be driven by:
//! - A tray/menu-bar shell
//! - The headless `tidyup-daemon`
//!
//! ## Key Concepts
//!
//! - **DirectoryEntry**: A watched directory, its destination, and age threshold
//! - **FileEntry**: A file seen during a scan and when it was last checked
//! - **State files**: Line-oriented text files holding each collection
//! - **Intent**: A user request from the shell, handled by the [`Controller`]

pub mod config;
pub mod intents;
pub mod lifecycle;
pub mod paths;
pub mod persistence;

// Re-export commonly used types
pub use config::TidyConfig;
pub use intents::{intent_channel, Intent, IntentReceiver, IntentSender};
pub use lifecycle::{Controller, Flow, LifecycleError};
pub use persistence::{DirectoryEntry, FileEntry, TrackedState};
