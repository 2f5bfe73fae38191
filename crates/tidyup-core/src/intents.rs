//! User intents sent from the UI shell to the controller.
//!
//! The shell (tray menu, stdin, signal handler) never touches state directly.
//! It sends [`Intent`]s through an [`IntentSender`] and the single owner of
//! the state receives and applies them in order.
//!
//! The channel is bounded: when the controller falls behind, senders wait
//! for room instead of losing intents.
//!
//! # Example
//!
//! ```rust
//! use tidyup_core::intents::{intent_channel, Intent};
//!
//! let (sender, mut receiver) = intent_channel();
//!
//! // From a plain thread:
//! // sender.blocking_send(Intent::ToggleStartup);
//!
//! // In async context:
//! // sender.send(Intent::Quit).await;
//! // let intent = receiver.recv().await.unwrap();
//! # drop((sender, receiver.try_recv()));
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::persistence::DirectoryEntry;

/// Default channel capacity.
/// Senders wait once this many intents are queued; nothing is dropped.
pub const DEFAULT_CAPACITY: usize = 64;

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Intent {
    /// Flip the "enable on startup" preference.
    ToggleStartup,

    /// Persist and exit.
    Quit,

    /// Log the current watch list and file list.
    ListState,

    /// Start watching a directory (or replace its configuration).
    Watch(DirectoryEntry),

    /// Stop watching a directory.
    #[serde(rename_all = "camelCase")]
    Unwatch { watch_path: String },

    /// Change how old files must be before they are tidied.
    #[serde(rename_all = "camelCase")]
    SetAgeThreshold { watch_path: String, hours: u64 },

    /// Permanently exclude a tracked file from tidying.
    Ignore { path: String },

    /// Record that a file was just evaluated.
    RecordCheck { path: String },
}

impl Intent {
    /// Whether handling this intent changes the persisted collections.
    pub fn mutates_state(&self) -> bool {
        matches!(
            self,
            Intent::Watch(_)
                | Intent::Unwatch { .. }
                | Intent::SetAgeThreshold { .. }
                | Intent::Ignore { .. }
                | Intent::RecordCheck { .. }
        )
    }
}

/// Receiving half, owned by the controller.
pub type IntentReceiver = mpsc::Receiver<Intent>;

/// Sending half. Cheap to clone; one per input source.
#[derive(Debug, Clone)]
pub struct IntentSender {
    sender: mpsc::Sender<Intent>,
}

/// Create a channel with default capacity.
pub fn intent_channel() -> (IntentSender, IntentReceiver) {
    intent_channel_with_capacity(DEFAULT_CAPACITY)
}

/// Create a channel with specified capacity.
pub fn intent_channel_with_capacity(capacity: usize) -> (IntentSender, IntentReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    (IntentSender { sender }, receiver)
}

impl IntentSender {
    /// Send an intent, waiting while the queue is full.
    ///
    /// Returns `false` if the receiver is gone.
    pub async fn send(&self, intent: Intent) -> bool {
        log::debug!("Intent: {:?}", intent);
        self.sender.send(intent).await.is_ok()
    }

    /// Send from a thread outside the async runtime, blocking while the
    /// queue is full.
    ///
    /// Panics if called from within an async context.
    pub fn blocking_send(&self, intent: Intent) -> bool {
        log::debug!("Intent: {:?}", intent);
        self.sender.blocking_send(intent).is_ok()
    }

    /// Whether the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

// ============================================================================
// TESTS
// ============================================================================
