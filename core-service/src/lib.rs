//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (settings storage,
//! secure storage, HTTP, credential prompt) into the album log core and
//! exposes one façade, [`MusicLog`]. Desktop apps typically enable the
//! `desktop-shims` feature and call [`bootstrap_desktop`], which fills every
//! missing bridge from `bridge-desktop`.
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, RemoteTarget};
//!
//! let log = core_service::bootstrap_desktop(
//!     CoreConfig::builder()
//!         .remote(RemoteTarget::new("octocat", "musiclog"))
//!         .enable_remote_sync(true)
//!         .enable_remote_bootstrap(true),
//! )
//! .await?;
//!
//! let committed = log.add(draft).await?;
//! if let Some(e) = &committed.cache_error {
//!     eprintln!("not saved locally: {e}");
//! }
//! ```

pub mod error;
pub mod music_log;

pub use error::{CoreError, Result};
pub use music_log::{BootstrapSource, Committed, MusicLog};

#[cfg(feature = "desktop-shims")]
use core_runtime::config::CoreConfigBuilder;

/// Convenience bootstrapper for desktop hosts.
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(builder: CoreConfigBuilder) -> Result<MusicLog> {
    let config = builder.build_with_desktop_defaults().await?;
    MusicLog::bootstrap(config).await
}
