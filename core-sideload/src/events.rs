//! # Progress Event Bus
//!
//! Run-time reporting for the sideload engine over `tokio::sync::broadcast`.
//! The engine emits one event per state transition; subscribers (the CLI, a
//! future GUI) render them independently. A slow subscriber receives
//! `RecvError::Lagged` and keeps going; event delivery never blocks the
//! engine.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Progress events emitted during a sideload run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SideloadEvent {
    /// Run-level status message (logging in, loading catalogs, ...).
    System {
        message: String,
    },
    /// A first-time transfer started for an item.
    Sideload {
        title: String,
    },
    /// An update transfer started for an item with a changed fingerprint.
    Update {
        title: String,
    },
    /// An item's fingerprint matches the transfer log; nothing to do.
    Skip {
        title: String,
    },
    /// One item's pipeline failed; siblings keep running.
    ItemFailed {
        title: String,
        message: String,
    },
    /// The run finished; final counters.
    Done {
        added: u64,
        updated: u64,
        skipped: u64,
        failed: u64,
    },
}

impl SideloadEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            SideloadEvent::System { .. } => "Run status",
            SideloadEvent::Sideload { .. } => "Sideloading item",
            SideloadEvent::Update { .. } => "Updating item",
            SideloadEvent::Skip { .. } => "Skipping item",
            SideloadEvent::ItemFailed { .. } => "Item transfer failed",
            SideloadEvent::Done { .. } => "Run complete",
        }
    }
}

/// Central broadcast channel for run progress.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SideloadEvent>,
}

impl EventBus {
    /// Create an event bus with the given buffer size.
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the subscriber count, or an error when there are none; the
    /// engine treats both as fire-and-forget.
    pub fn emit(
        &self,
        event: SideloadEvent,
    ) -> std::result::Result<usize, SendError<SideloadEvent>> {
        self.sender.send(event)
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> Receiver<SideloadEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}
