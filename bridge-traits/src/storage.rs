//! Durable storage capabilities.
//!
//! Two stores with different guarantees: [`SecureStore`] for the remote
//! credential, [`SettingsStore`] for the local album cache.

use async_trait::async_trait;

use crate::error::Result;

/// Platform secret storage (OS keychain, Secret Service, Credential Manager).
///
/// Implementations keep values encrypted at rest and must not log them.
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// store.set_secret("github-token", token.as_bytes()).await?;
/// ```
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// `Ok(None)` when the key is absent.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Deleting a missing key is not an error.
    async fn delete_secret(&self, key: &str) -> Result<()>;

    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }
}

/// String key-value storage that survives restarts.
///
/// The album cache keeps the whole collection as one JSON string under a
/// single key, so values may run to several hundred kilobytes.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }
}
