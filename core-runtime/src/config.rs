//! # Core Configuration Module
//!
//! Provides configuration management for the album log core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary dependencies and settings for the core library.
//! It enforces fail-fast validation to ensure all required bridges are provided
//! before initialization.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - Required for the local album cache
//! - `SecureStore` - Required for credential persistence
//!
//! ## Required When Remote Sync Is Enabled
//!
//! - `RemoteTarget` - Repository, branch, and path of the remote document
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `CredentialPrompt` - Source of the bearer credential (desktop default: environment)
//!
//! When the `desktop-shims` feature is enabled,
//! [`build_with_desktop_defaults`](CoreConfigBuilder::build_with_desktop_defaults)
//! injects desktop-ready implementations for every bridge not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, RemoteTarget};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .remote(RemoteTarget::new("octocat", "music-log"))
//!     .http_client(Arc::new(MyHttpClient))
//!     .secure_store(Arc::new(MySecureStore))
//!     .settings_store(Arc::new(MySettingsStore))
//!     .credential_prompt(Arc::new(MyPrompt))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! The builder validates all required dependencies and provides actionable error
//! messages when capabilities are missing:
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Fails: no settings store or secure store was provided
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    Clock, CredentialPrompt, HttpClient, NoCredentialPrompt, SecureStore, SettingsStore,
    SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Default GitHub REST endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
/// Default remote document path
pub const DEFAULT_REMOTE_PATH: &str = "albums.json";
/// Default remote branch
pub const DEFAULT_BRANCH: &str = "main";
/// Default settings key holding the cached collection
pub const DEFAULT_CACHE_KEY: &str = "musiclog-albums";
/// Default secure store key holding the bearer credential
pub const DEFAULT_CREDENTIAL_KEY: &str = "github-token";
/// Default image proxy used for cover display
pub const DEFAULT_IMAGE_PROXY_URL: &str = "https://images.weserv.nl/";

/// Location of the remote collection document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// REST API base, without trailing slash
    pub api_base_url: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Path of the document inside the repository
    pub path: String,
    /// Branch receiving commits
    pub branch: String,
}

impl RemoteTarget {
    /// Target `owner/repo` with the default path, branch, and API endpoint.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            path: DEFAULT_REMOTE_PATH.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Validates the target
    pub fn validate(&self) -> Result<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "Remote API base URL must be http(s): {}",
                self.api_base_url
            )));
        }

        for (name, value) in [("owner", &self.owner), ("repo", &self.repo)] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("Remote {} cannot be empty", name)));
            }
            if value.contains('/') {
                return Err(Error::Config(format!(
                    "Remote {} cannot contain '/': {}",
                    name, value
                )));
            }
        }

        if self.path.trim().trim_matches('/').is_empty() {
            return Err(Error::Config("Remote path cannot be empty".to_string()));
        }

        if self.branch.trim().is_empty() {
            return Err(Error::Config("Remote branch cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Core configuration for the album log core.
///
/// This struct holds all dependencies and settings required to initialize
/// the core library. Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Remote document location (required when remote features are enabled)
    pub remote: Option<RemoteTarget>,

    /// Settings key for the cached collection
    pub cache_key: String,

    /// Secure store key for the bearer credential
    pub credential_key: String,

    /// Image proxy endpoint used to rewrite cover URLs for display
    pub image_proxy_url: String,

    /// HTTP client for the remote API (required when remote features are enabled)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Secure credential storage (required)
    pub secure_store: Arc<dyn SecureStore>,

    /// Local cache storage (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Source of the bearer credential
    pub credential_prompt: Arc<dyn CredentialPrompt>,

    /// Time source for record timestamps
    pub clock: Arc<dyn Clock>,

    /// Features flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("remote", &self.remote)
            .field("cache_key", &self.cache_key)
            .field("credential_key", &self.credential_key)
            .field("image_proxy_url", &self.image_proxy_url)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("secure_store", &"SecureStore { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("credential_prompt", &"CredentialPrompt { ... }")
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Mirror every mutation to the remote document
    pub enable_remote_sync: bool,

    /// Read the remote document at startup before falling back to the cache
    pub enable_remote_bootstrap: bool,
}

impl FeatureFlags {
    /// Whether any feature needs the remote document
    pub fn uses_remote(&self) -> bool {
        self.enable_remote_sync || self.enable_remote_bootstrap
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Storage keys are not empty
    /// - The image proxy is an http(s) URL
    /// - Remote features have a target and an HTTP client
    pub fn validate(&self) -> Result<()> {
        if self.cache_key.trim().is_empty() {
            return Err(Error::Config("Cache key cannot be empty".to_string()));
        }

        if self.credential_key.trim().is_empty() {
            return Err(Error::Config("Credential key cannot be empty".to_string()));
        }

        if !self.image_proxy_url.starts_with("http://")
            && !self.image_proxy_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "Image proxy URL must be http(s): {}",
                self.image_proxy_url
            )));
        }

        if self.features.uses_remote() {
            match &self.remote {
                Some(target) => target.validate()?,
                None => {
                    return Err(Error::Config(
                        "Remote sync enabled but no RemoteTarget provided. \
                         Use .remote() to set the repository or disable remote features."
                            .to_string(),
                    ))
                }
            }

            if self.http_client.is_none() {
                return Err(http_client_missing_error());
            }
        }

        Ok(())
    }
}

fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for remote sync. \
                 Desktop: use build_with_desktop_defaults() with the 'desktop-shims' feature. \
                 Other hosts: inject an HttpClient or disable remote features."
            .to_string(),
    }
}

fn secure_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SecureStore".to_string(),
        message: "SecureStore implementation is required for credential persistence. \
                 Desktop: use build_with_desktop_defaults() to get the KeyringSecureStore. \
                 Other hosts: inject platform secure storage."
            .to_string(),
    }
}

fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for the local album cache. \
                 Desktop: use build_with_desktop_defaults() to get the SqliteSettingsStore. \
                 Web: inject a localStorage-backed settings store."
            .to_string(),
    }
}

fn credential_prompt_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "CredentialPrompt".to_string(),
        message: "CredentialPrompt implementation is required for remote sync. \
                 Desktop: use build_with_desktop_defaults() to read MUSICLOG_GITHUB_TOKEN. \
                 Other hosts: inject a prompt that asks the user for a token."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then
/// call [`build()`](CoreConfigBuilder::build) to create the final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    remote: Option<RemoteTarget>,
    cache_key: Option<String>,
    credential_key: Option<String>,
    image_proxy_url: Option<String>,
    data_dir: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    credential_prompt: Option<Arc<dyn CredentialPrompt>>,
    clock: Option<Arc<dyn Clock>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the remote document location and enables remote sync and bootstrap.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::{CoreConfig, RemoteTarget};
    ///
    /// let builder = CoreConfig::builder()
    ///     .remote(RemoteTarget::new("octocat", "music-log").with_branch("data"));
    /// ```
    pub fn remote(mut self, target: RemoteTarget) -> Self {
        self.remote = Some(target);
        self.features.enable_remote_sync = true;
        self.features.enable_remote_bootstrap = true;
        self
    }

    /// Sets the settings key for the cached collection.
    ///
    /// Default: `musiclog-albums`
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Sets the secure store key for the bearer credential.
    ///
    /// Default: `github-token`
    pub fn credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = Some(key.into());
        self
    }

    /// Sets the image proxy endpoint.
    ///
    /// Default: `https://images.weserv.nl/`
    pub fn image_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.image_proxy_url = Some(url.into());
        self
    }

    /// Sets the directory used by desktop defaults for the settings database.
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the secure store implementation (required).
    ///
    /// The secure store persists the bearer credential between runs.
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    /// Sets the settings store implementation (required).
    ///
    /// The settings store holds the local album cache.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the credential prompt (required when remote sync is enabled).
    pub fn credential_prompt(mut self, prompt: Arc<dyn CredentialPrompt>) -> Self {
        self.credential_prompt = Some(prompt);
        self
    }

    /// Sets the clock. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Enables or disables pushing mutations to the remote document.
    pub fn enable_remote_sync(mut self, enabled: bool) -> Self {
        self.features.enable_remote_sync = enabled;
        self
    }

    /// Enables or disables reading the remote document at startup.
    pub fn enable_remote_bootstrap(mut self, enabled: bool) -> Self {
        self.features.enable_remote_bootstrap = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing (SecureStore, SettingsStore)
    /// - Remote sync is enabled without an HttpClient or CredentialPrompt
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let settings_store = self
            .settings_store
            .ok_or_else(settings_store_missing_error)?;

        let secure_store = self.secure_store.ok_or_else(secure_store_missing_error)?;

        let credential_prompt = match self.credential_prompt {
            Some(prompt) => prompt,
            None if self.features.enable_remote_sync => {
                return Err(credential_prompt_missing_error())
            }
            None => Arc::new(NoCredentialPrompt),
        };

        let config = CoreConfig {
            remote: self.remote,
            cache_key: self
                .cache_key
                .unwrap_or_else(|| DEFAULT_CACHE_KEY.to_string()),
            credential_key: self
                .credential_key
                .unwrap_or_else(|| DEFAULT_CREDENTIAL_KEY.to_string()),
            image_proxy_url: self
                .image_proxy_url
                .unwrap_or_else(|| DEFAULT_IMAGE_PROXY_URL.to_string()),
            http_client: self.http_client,
            secure_store,
            settings_store,
            credential_prompt,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }

    /// Builds the config, filling every missing bridge with its desktop default.
    ///
    /// - `SettingsStore`: SQLite database `musiclog.db` in the data directory
    /// - `SecureStore`: OS keyring
    /// - `HttpClient`: reqwest (only when remote features are enabled)
    /// - `CredentialPrompt`: `MUSICLOG_GITHUB_TOKEN` environment variable
    #[cfg(feature = "desktop-shims")]
    pub async fn build_with_desktop_defaults(mut self) -> Result<CoreConfig> {
        use bridge_desktop::{
            EnvCredentialPrompt, KeyringSecureStore, ReqwestHttpClient, SqliteSettingsStore,
        };

        if self.settings_store.is_none() {
            let dir = self
                .data_dir
                .clone()
                .unwrap_or_else(bridge_desktop::default_data_dir);
            let store = SqliteSettingsStore::new(dir.join("musiclog.db"))
                .await
                .map_err(|e| {
                    Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
                })?;
            self.settings_store = Some(Arc::new(store));
        }

        if self.secure_store.is_none() {
            self.secure_store = Some(Arc::new(KeyringSecureStore::new()));
        }

        if self.http_client.is_none() && self.features.uses_remote() {
            let client = ReqwestHttpClient::new().map_err(|e| {
                Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
            })?;
            self.http_client = Some(Arc::new(client));
        }

        if self.credential_prompt.is_none() {
            self.credential_prompt = Some(Arc::new(EnvCredentialPrompt::new()));
        }

        self.build()
    }
}
