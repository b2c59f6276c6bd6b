//! # Remote Sync Module
//!
//! Mirrors the album collection to a remote versioned file.
//!
//! ## Overview
//!
//! - [`RemoteSyncAdapter`] pushes a full snapshot with a conditional write
//!   and reads the remote collection at startup
//! - [`PushQueue`] runs pushes on a background task, one at a time,
//!   collapsing snapshots that arrive while a push is in flight
//!
//! Pushes are best-effort: failures are reported through [`PushOutcome`]
//! and events, never by rolling back local state.

pub mod adapter;
pub mod error;
pub mod queue;

pub use adapter::{PushOutcome, RemoteSyncAdapter, SnapshotSink};
pub use error::{Result, SyncError};
pub use queue::{PushQueue, PushTicket};
