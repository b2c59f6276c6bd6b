//! # Credential Manager
//!
//! Resolves the bearer credential for remote writes and forgets it when the
//! remote rejects it.
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::{CredentialManager, CredentialStore};
//! use core_runtime::events::EventBus;
//! use bridge_traits::StaticCredentialPrompt;
//! use std::sync::Arc;
//! # use bridge_traits::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) {
//! let store = CredentialStore::new(secure_store, "github-token");
//! let manager = CredentialManager::new(
//!     store,
//!     Arc::new(StaticCredentialPrompt::new("ghp_example")),
//!     EventBus::new(100),
//! );
//!
//! if let Some(credential) = manager.resolve().await {
//!     // send credential.expose() with the write
//! # let _ = credential;
//! }
//! # }
//! ```

use crate::credential_store::CredentialStore;
use crate::types::{BearerCredential, CredentialSource};
use bridge_traits::CredentialPrompt;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Owns the bearer credential lifecycle.
///
/// Resolution order is cache, then secure store, then host prompt. Concurrent
/// callers of [`resolve`](Self::resolve) share one prompt.
pub struct CredentialManager {
    store: CredentialStore,
    prompt: Arc<dyn CredentialPrompt>,
    event_bus: EventBus,
    cached: RwLock<Option<BearerCredential>>,
    resolve_lock: Mutex<()>,
}

impl CredentialManager {
    pub fn new(
        store: CredentialStore,
        prompt: Arc<dyn CredentialPrompt>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            prompt,
            event_bus,
            cached: RwLock::new(None),
            resolve_lock: Mutex::new(()),
        }
    }

    /// Returns a credential, prompting the host when none is known.
    ///
    /// Returns `None` when the host declines. Storage failures are logged and
    /// do not prevent the prompt from being used.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Option<BearerCredential> {
        if let Some(credential) = self.cached.read().await.clone() {
            return Some(credential);
        }

        let _guard = self.resolve_lock.lock().await;

        // Another caller may have resolved while we waited.
        if let Some(credential) = self.cached.read().await.clone() {
            return Some(credential);
        }

        if let Some(credential) = self.from_store().await {
            return Some(credential);
        }

        debug!("No stored credential, asking host");
        let Some(credential) = self
            .prompt
            .request_credential()
            .await
            .and_then(BearerCredential::new)
        else {
            info!("Host declined to provide a credential");
            let _ = self
                .event_bus
                .emit(CoreEvent::Auth(AuthEvent::CredentialDeclined));
            return None;
        };

        if let Err(e) = self.store.store(&credential).await {
            warn!(error = %e, "Credential will not survive restart");
        }

        self.remember(credential.clone(), CredentialSource::Prompt)
            .await;
        Some(credential)
    }

    /// Returns a credential only if one is already known. Never prompts.
    #[instrument(skip(self))]
    pub async fn peek(&self) -> Option<BearerCredential> {
        if let Some(credential) = self.cached.read().await.clone() {
            return Some(credential);
        }

        let _guard = self.resolve_lock.lock().await;
        if let Some(credential) = self.cached.read().await.clone() {
            return Some(credential);
        }
        self.from_store().await
    }

    /// Forget `rejected` after the remote refused it.
    ///
    /// Nothing happens when the current credential is a different one, so a
    /// late rejection of an old credential cannot wipe its replacement.
    /// Returns whether the credential was forgotten.
    #[instrument(skip(self, rejected))]
    pub async fn invalidate(&self, rejected: &BearerCredential, reason: &str) -> bool {
        let _guard = self.resolve_lock.lock().await;

        let cached = self.cached.read().await.clone();
        let current = match cached {
            Some(credential) => Some(credential),
            None => self.store.retrieve().await.ok().flatten(),
        };
        if current.as_ref().is_some_and(|current| current != rejected) {
            debug!("Rejected credential was already replaced");
            return false;
        }

        self.cached.write().await.take();
        if let Err(e) = self.store.delete().await {
            warn!(error = %e, "Failed to remove rejected credential");
        }

        info!(reason, "Credential invalidated");
        let _ = self
            .event_bus
            .emit(CoreEvent::Auth(AuthEvent::CredentialInvalidated {
                reason: reason.to_string(),
            }));
        true
    }

    /// Replace the credential with one supplied directly by the host.
    pub async fn set_credential(&self, credential: BearerCredential) -> crate::Result<()> {
        let _guard = self.resolve_lock.lock().await;
        self.store.store(&credential).await?;
        *self.cached.write().await = Some(credential);
        Ok(())
    }

    /// Whether a credential is cached or stored.
    pub async fn has_credential(&self) -> bool {
        if self.cached.read().await.is_some() {
            return true;
        }
        self.store.has_credential().await.unwrap_or(false)
    }

    async fn from_store(&self) -> Option<BearerCredential> {
        match self.store.retrieve().await {
            Ok(Some(credential)) => {
                self.remember(credential.clone(), CredentialSource::SecureStore)
                    .await;
                Some(credential)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable stored credential");
                None
            }
        }
    }

    async fn remember(&self, credential: BearerCredential, source: CredentialSource) {
        *self.cached.write().await = Some(credential);
        debug!(%source, "Credential cached");
        let _ = self
            .event_bus
            .emit(CoreEvent::Auth(AuthEvent::CredentialResolved {
                source: source.to_string(),
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential_store::tests::MockSecureStore;
    use async_trait::async_trait;
    use bridge_traits::{NoCredentialPrompt, SecureStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPrompt {
        answer: Option<String>,
        calls: AtomicUsize,
    }

    impl CountingPrompt {
        fn new(answer: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.map(str::to_string),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialPrompt for CountingPrompt {
        async fn request_credential(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.answer.clone()
        }
    }

    fn manager_with(
        secure_store: Arc<MockSecureStore>,
        prompt: Arc<dyn CredentialPrompt>,
    ) -> (CredentialManager, EventBus) {
        let bus = EventBus::new(32);
        let store = CredentialStore::new(secure_store, "github-token");
        (CredentialManager::new(store, prompt, bus.clone()), bus)
    }

    #[tokio::test]
    async fn test_resolve_prefers_secure_store() {
        let secure_store = Arc::new(MockSecureStore::new());
        secure_store
            .set_secret("github-token", b"ghp_stored")
            .await
            .unwrap();
        let prompt = CountingPrompt::new(Some("ghp_prompted"));
        let (manager, _bus) = manager_with(secure_store, prompt.clone());

        let credential = manager.resolve().await.unwrap();
        assert_eq!(credential.expose(), "ghp_stored");
        assert_eq!(prompt.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompted_credential_is_persisted_and_cached() {
        let secure_store = Arc::new(MockSecureStore::new());
        let prompt = CountingPrompt::new(Some("  ghp_prompted \n"));
        let (manager, bus) = manager_with(secure_store.clone(), prompt.clone());
        let mut events = bus.subscribe();

        assert_eq!(manager.resolve().await.unwrap().expose(), "ghp_prompted");
        assert_eq!(manager.resolve().await.unwrap().expose(), "ghp_prompted");
        assert_eq!(prompt.calls(), 1);
        assert_eq!(
            secure_store.raw("github-token").await,
            Some(b"ghp_prompted".to_vec())
        );

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            CoreEvent::Auth(AuthEvent::CredentialResolved {
                source: "prompt".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_declined_prompt_returns_none() {
        let secure_store = Arc::new(MockSecureStore::new());
        let (manager, bus) = manager_with(secure_store.clone(), Arc::new(NoCredentialPrompt));
        let mut events = bus.subscribe();

        assert!(manager.resolve().await.is_none());
        assert!(secure_store.raw("github-token").await.is_none());
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Auth(AuthEvent::CredentialDeclined)
        );
    }

    #[tokio::test]
    async fn test_blank_prompt_answer_counts_as_declined() {
        let prompt = CountingPrompt::new(Some("   "));
        let (manager, _bus) = manager_with(Arc::new(MockSecureStore::new()), prompt.clone());

        assert!(manager.resolve().await.is_none());
        assert_eq!(prompt.calls(), 1);
    }

    #[tokio::test]
    async fn test_peek_never_prompts() {
        let prompt = CountingPrompt::new(Some("ghp_prompted"));
        let secure_store = Arc::new(MockSecureStore::new());
        let (manager, _bus) = manager_with(secure_store.clone(), prompt.clone());

        assert!(manager.peek().await.is_none());
        assert_eq!(prompt.calls(), 0);

        secure_store
            .set_secret("github-token", b"ghp_stored")
            .await
            .unwrap();
        assert_eq!(manager.peek().await.unwrap().expose(), "ghp_stored");
        assert_eq!(prompt.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_forgets_and_reprompts() {
        let secure_store = Arc::new(MockSecureStore::new());
        let prompt = CountingPrompt::new(Some("ghp_prompted"));
        let (manager, bus) = manager_with(secure_store.clone(), prompt.clone());

        let rejected = manager.resolve().await.unwrap();
        let mut events = bus.subscribe();

        assert!(manager.invalidate(&rejected, "Bad credentials").await);
        assert!(!manager.has_credential().await);
        assert!(secure_store.raw("github-token").await.is_none());
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Auth(AuthEvent::CredentialInvalidated {
                reason: "Bad credentials".to_string()
            })
        );

        manager.resolve().await.unwrap();
        assert_eq!(prompt.calls(), 2);
    }

    #[tokio::test]
    async fn test_late_rejection_keeps_replacement() {
        let secure_store = Arc::new(MockSecureStore::new());
        let prompt = CountingPrompt::new(Some("ghp_old"));
        let (manager, _bus) = manager_with(secure_store.clone(), prompt.clone());

        let old = manager.resolve().await.unwrap();
        manager
            .set_credential(BearerCredential::new("ghp_new").unwrap())
            .await
            .unwrap();

        assert!(!manager.invalidate(&old, "Bad credentials").await);
        assert_eq!(manager.resolve().await.unwrap().expose(), "ghp_new");
        assert_eq!(
            secure_store.raw("github-token").await,
            Some(b"ghp_new".to_vec())
        );
        assert_eq!(prompt.calls(), 1);
    }

    #[tokio::test]
    async fn test_rejection_after_restart_clears_store() {
        let secure_store = Arc::new(MockSecureStore::new());
        secure_store
            .set_secret("github-token", b"ghp_stored")
            .await
            .unwrap();
        let (manager, _bus) =
            manager_with(secure_store.clone(), Arc::new(NoCredentialPrompt));

        let rejected = BearerCredential::new("ghp_stored").unwrap();
        assert!(manager.invalidate(&rejected, "Bad credentials").await);
        assert!(secure_store.raw("github-token").await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolve_prompts_once() {
        let prompt = CountingPrompt::new(Some("ghp_prompted"));
        let (manager, _bus) = manager_with(Arc::new(MockSecureStore::new()), prompt.clone());
        let manager = Arc::new(manager);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.resolve().await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }
        assert_eq!(prompt.calls(), 1);
    }

    #[tokio::test]
    async fn test_set_credential() {
        let secure_store = Arc::new(MockSecureStore::new());
        let (manager, _bus) = manager_with(secure_store.clone(), Arc::new(NoCredentialPrompt));

        manager
            .set_credential(BearerCredential::new("ghp_manual").unwrap())
            .await
            .unwrap();

        assert!(manager.has_credential().await);
        assert_eq!(manager.resolve().await.unwrap().expose(), "ghp_manual");
        assert_eq!(
            secure_store.raw("github-token").await,
            Some(b"ghp_manual".to_vec())
        );
    }
}
