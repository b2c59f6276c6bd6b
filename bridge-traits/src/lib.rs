//! # Host Bridge Traits
//!
//! Capability traits the album log core requires from its host.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and host-specific
//! implementations. Each trait represents a capability the core needs but that
//! is provided differently per host (desktop today, browser storage later).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//! - [`VersionedBlobStore`](blob::VersionedBlobStore) - Remote document with optimistic concurrency
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (Keychain/Secret Service)
//! - [`SettingsStore`](storage::SettingsStore) - Durable key-value storage for the local cache
//! - [`CredentialPrompt`](credential::CredentialPrompt) - Ask the user for a bearer credential
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is missing:
//!
//! ```ignore
//! let settings = config.settings_store
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "SettingsStore".to_string(),
//!         message: "No settings store provided. \
//!                   Desktop: enable the desktop-shims feature.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Host
//! implementations should convert their own errors into it and keep messages
//! actionable. Credentials must never appear in error messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind `Arc<dyn Trait>`.

pub mod blob;
pub mod credential;
pub mod error;
pub mod http;
pub mod logging;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use blob::{BlobWrite, VersionedBlob, VersionedBlobStore};
pub use credential::{CredentialPrompt, NoCredentialPrompt, StaticCredentialPrompt};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::{SecureStore, SettingsStore};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use time::{Clock, FixedClock, SystemClock};
