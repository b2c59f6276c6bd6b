//! # Desktop Bridge
//!
//! Host capabilities for running the album log on macOS, Windows and Linux:
//!
//! | Capability | Implementation |
//! |------------|----------------|
//! | `HttpClient` | [`ReqwestHttpClient`] |
//! | `SettingsStore` | [`SqliteSettingsStore`], one SQLite file |
//! | `SecureStore` | `KeyringSecureStore` (feature `secure-store`, on by default) |
//! | `CredentialPrompt` | [`EnvCredentialPrompt`], reads `MUSICLOG_GITHUB_TOKEN` |
//!
//! `core_runtime::config::CoreConfigBuilder::build_with_desktop_defaults`
//! wires these up; construct them directly to override paths or timeouts.
//!
//! ```ignore
//! let settings = SqliteSettingsStore::new(default_data_dir().join("musiclog.db")).await?;
//! let http = ReqwestHttpClient::with_timeout(Duration::from_secs(10))?;
//! ```

use std::path::PathBuf;

mod http;
mod prompt;
mod settings;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use http::ReqwestHttpClient;
pub use prompt::{EnvCredentialPrompt, DEFAULT_TOKEN_VAR};
pub use settings::SqliteSettingsStore;

#[cfg(feature = "secure-store")]
pub use secure_store::{KeyringSecureStore, DEFAULT_SERVICE};

/// Per-user data directory for the album log, falling back to the working
/// directory when the platform reports none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("musiclog")
}
