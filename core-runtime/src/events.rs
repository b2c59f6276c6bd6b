//! # Core Events
//!
//! Broadcast notifications about the collection, the remote document and
//! the credential. Hosts subscribe instead of registering callbacks; the
//! core publishes with `let _ = bus.emit(..)` and never waits on listeners.
//!
//! ```text
//! CredentialManager ─┐
//! PushQueue ─────────┼─ emit ─> EventBus (tokio broadcast) ─ subscribe ─> host
//! MusicLog ──────────┘
//! ```
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut rx = event_bus.subscribe();
//!
//! event_bus.emit(CoreEvent::Library(LibraryEvent::AlbumRemoved {
//!     album_id: "1700000000000".to_string(),
//! })).ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.description(), "Album removed");
//! # }
//! ```
//!
//! A slow subscriber sees `RecvError::Lagged(n)` and keeps receiving newer
//! events; `RecvError::Closed` means the core was dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Credential lifecycle events
    Auth(AuthEvent),
    /// Remote document events
    Sync(SyncEvent),
    /// Collection change events
    Library(LibraryEvent),
    /// Local cache events
    Cache(CacheEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Cache(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Cache(CacheEvent::WriteFailed { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::PushFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::CredentialInvalidated { .. }) => EventSeverity::Warning,
            CoreEvent::Sync(SyncEvent::PushSucceeded { .. }) => EventSeverity::Info,
            CoreEvent::Sync(SyncEvent::BootstrapCompleted { .. }) => EventSeverity::Info,
            CoreEvent::Library(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Events related to the bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// A credential became available.
    CredentialResolved {
        /// Where it came from: "secure_store" or "prompt".
        source: String,
    },
    /// The host declined to provide a credential.
    CredentialDeclined,
    /// The remote rejected the credential; it was forgotten.
    CredentialInvalidated {
        /// Reason reported by the remote.
        reason: String,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::CredentialResolved { .. } => "Credential resolved",
            AuthEvent::CredentialDeclined => "Credential declined",
            AuthEvent::CredentialInvalidated { .. } => "Credential invalidated",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Where the collection was loaded from at startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BootstrapOrigin {
    Remote,
    LocalCache,
    Empty,
}

/// Events related to the remote document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// The collection was loaded at startup.
    BootstrapCompleted {
        origin: BootstrapOrigin,
        album_count: usize,
    },
    /// A push began.
    PushStarted {
        /// Queue generation of the snapshot being pushed.
        generation: u64,
        album_count: usize,
    },
    /// The remote accepted the snapshot.
    PushSucceeded {
        generation: u64,
        /// New remote version token.
        version: String,
    },
    /// No credential was available; nothing was sent.
    PushSkipped { generation: u64 },
    /// The push failed; local state is unaffected.
    PushFailed {
        generation: u64,
        /// Human-readable error message.
        message: String,
        /// Failure class: "authentication", "conflict", "network", "remote", "encoding".
        kind: String,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::BootstrapCompleted { .. } => "Collection loaded",
            SyncEvent::PushStarted { .. } => "Push started",
            SyncEvent::PushSucceeded { .. } => "Push published",
            SyncEvent::PushSkipped { .. } => "Push skipped",
            SyncEvent::PushFailed { .. } => "Push failed",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events related to collection changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// New album logged.
    AlbumAdded {
        album_id: String,
        title: String,
        artist: String,
    },
    /// Album edited.
    AlbumUpdated { album_id: String },
    /// Album deleted.
    AlbumRemoved { album_id: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::AlbumAdded { .. } => "Album added",
            LibraryEvent::AlbumUpdated { .. } => "Album updated",
            LibraryEvent::AlbumRemoved { .. } => "Album removed",
        }
    }
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events related to the local cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// Writing the collection to the local cache failed.
    WriteFailed { message: String },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::WriteFailed { .. } => "Local cache write failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for broadcasting events to multiple subscribers.
///
/// Cloning is cheap; every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer capacity.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received it, or an error when
    /// nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscription to the event bus.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
