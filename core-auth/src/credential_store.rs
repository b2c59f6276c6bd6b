//! Secure Credential Storage
//!
//! Persists the bearer credential in the platform secure store
//! (Keychain, Credential Manager, Secret Service) under a single key.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{BearerCredential, CredentialStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let store = CredentialStore::new(secure_store, "github-token");
//!
//! let credential = BearerCredential::new("ghp_example").unwrap();
//! store.store(&credential).await?;
//!
//! let retrieved = store.retrieve().await?;
//! assert!(retrieved.is_some());
//!
//! store.delete().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::BearerCredential;
use bridge_traits::storage::SecureStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Secure storage for the bearer credential.
///
/// The credential is written as raw UTF-8 bytes. Values are never logged.
#[derive(Clone)]
pub struct CredentialStore {
    secure_store: Arc<dyn SecureStore>,
    key: String,
}

impl CredentialStore {
    pub fn new(secure_store: Arc<dyn SecureStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        debug!(key = %key, "Initializing CredentialStore");
        Self { secure_store, key }
    }

    /// Key the credential is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Store the credential, overwriting any previous value.
    pub async fn store(&self, credential: &BearerCredential) -> Result<()> {
        self.secure_store
            .set_secret(&self.key, credential.expose().as_bytes())
            .await
            .map_err(|e| {
                warn!(key = %self.key, error = %e, "Failed to store credential");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(key = %self.key, "Credential stored securely");
        Ok(())
    }

    /// Retrieve the stored credential.
    ///
    /// Returns `Ok(None)` when nothing is stored. Data that is not valid
    /// UTF-8, or is blank, is deleted and reported as
    /// [`AuthError::CredentialCorrupted`].
    pub async fn retrieve(&self) -> Result<Option<BearerCredential>> {
        let data = self.secure_store.get_secret(&self.key).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to read credential");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!(key = %self.key, "No credential in secure storage");
            return Ok(None);
        };

        let parsed = String::from_utf8(data)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                BearerCredential::new(raw).ok_or_else(|| "stored value is blank".to_string())
            });

        match parsed {
            Ok(credential) => {
                debug!(key = %self.key, "Credential retrieved");
                Ok(Some(credential))
            }
            Err(reason) => {
                warn!(key = %self.key, reason = %reason, "Stored credential is corrupted");

                if let Err(delete_err) = self.secure_store.delete_secret(&self.key).await {
                    warn!(
                        key = %self.key,
                        error = %delete_err,
                        "Failed to delete corrupted credential"
                    );
                }

                Err(AuthError::CredentialCorrupted { reason })
            }
        }
    }

    /// Delete the stored credential. Idempotent.
    pub async fn delete(&self) -> Result<()> {
        self.secure_store
            .delete_secret(&self.key)
            .await
            .map_err(|e| {
                warn!(key = %self.key, error = %e, "Failed to delete credential");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(key = %self.key, "Credential deleted");
        Ok(())
    }

    /// Check whether a credential is stored without reading it.
    pub async fn has_credential(&self) -> Result<bool> {
        self.secure_store
            .has_secret(&self.key)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// In-memory SecureStore for testing
    #[derive(Clone, Default)]
    pub(crate) struct MockSecureStore {
        storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockSecureStore {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) async fn raw(&self, key: &str) -> Option<Vec<u8>> {
            self.storage.lock().await.get(key).cloned()
        }
    }

    #[async_trait::async_trait]
    impl SecureStore for MockSecureStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> bridge_traits::error::Result<()> {
            let mut storage = self.storage.lock().await;
            storage.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> bridge_traits::error::Result<Option<Vec<u8>>> {
            let storage = self.storage.lock().await;
            Ok(storage.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> bridge_traits::error::Result<()> {
            let mut storage = self.storage.lock().await;
            storage.remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let secure_store = Arc::new(MockSecureStore::new());
        let store = CredentialStore::new(secure_store.clone(), "github-token");

        let credential = BearerCredential::new("ghp_abc123").unwrap();
        store.store(&credential).await.unwrap();

        assert_eq!(
            secure_store.raw("github-token").await,
            Some(b"ghp_abc123".to_vec())
        );
        assert_eq!(store.retrieve().await.unwrap(), Some(credential));
        assert!(store.has_credential().await.unwrap());
    }

    #[tokio::test]
    async fn test_retrieve_missing() {
        let store = CredentialStore::new(Arc::new(MockSecureStore::new()), "github-token");
        assert!(store.retrieve().await.unwrap().is_none());
        assert!(!store.has_credential().await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = CredentialStore::new(Arc::new(MockSecureStore::new()), "github-token");
        store
            .store(&BearerCredential::new("ghp_abc").unwrap())
            .await
            .unwrap();

        store.delete().await.unwrap();
        store.delete().await.unwrap();
        assert!(store.retrieve().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_credential_is_removed() {
        let secure_store = Arc::new(MockSecureStore::new());
        secure_store
            .set_secret("github-token", &[0xff, 0xfe, 0x00])
            .await
            .unwrap();

        let store = CredentialStore::new(secure_store.clone(), "github-token");
        let result = store.retrieve().await;

        assert!(matches!(result, Err(AuthError::CredentialCorrupted { .. })));
        assert!(secure_store.raw("github-token").await.is_none());
    }

    #[tokio::test]
    async fn test_blank_credential_is_corrupted() {
        let secure_store = Arc::new(MockSecureStore::new());
        secure_store.set_secret("github-token", b"   ").await.unwrap();

        let store = CredentialStore::new(secure_store.clone(), "github-token");
        assert!(matches!(
            store.retrieve().await,
            Err(AuthError::CredentialCorrupted { .. })
        ));
        assert!(secure_store.raw("github-token").await.is_none());
    }
}
