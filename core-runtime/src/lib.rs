//! # Core Runtime
//!
//! Process-level plumbing shared by every album log crate:
//!
//! - [`config`]: `CoreConfig` builder, remote target, feature flags, host
//!   bridges
//! - [`logging`]: `tracing` subscriber setup and host log forwarding
//! - [`events`]: broadcast bus for collection, sync and credential events

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
