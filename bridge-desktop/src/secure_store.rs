//! OS keychain `SecureStore`.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use keyring::Entry;
use tracing::debug;

/// Keychain service name used unless overridden
pub const DEFAULT_SERVICE: &str = "musiclog";

/// Secrets kept in the platform keychain (macOS Keychain, Windows
/// Credential Manager, Secret Service on Linux), one entry per key under a
/// common service name.
///
/// Keychain calls block, so each one runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct KeyringSecureStore {
    service: String,
}

impl KeyringSecureStore {
    pub fn new() -> Self {
        Self::with_service_name(DEFAULT_SERVICE)
    }

    pub fn with_service_name(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    async fn with_entry<T, F>(&self, key: &str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Entry) -> keyring::Result<T> + Send + 'static,
    {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &key)?;
            op(&entry)
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Keychain task failed: {}", e)))?
        .map_err(keychain_error)
    }
}

impl Default for KeyringSecureStore {
    fn default() -> Self {
        Self::new()
    }
}

fn keychain_error(e: keyring::Error) -> BridgeError {
    match e {
        keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
            BridgeError::NotAvailable(format!("Keychain unavailable: {}", e))
        }
        other => BridgeError::OperationFailed(format!("Keychain error: {}", other)),
    }
}

#[async_trait]
impl SecureStore for KeyringSecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        let value = value.to_vec();
        self.with_entry(key, move |entry| entry.set_secret(&value))
            .await?;
        debug!(key, "Secret stored in keychain");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_entry(key, |entry| match entry.get_secret() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        })
        .await
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        })
        .await?;
        debug!(key, "Secret removed from keychain");
        Ok(())
    }
}
