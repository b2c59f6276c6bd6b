//! # Credential Module
//!
//! Resolves, caches and forgets the bearer credential used for remote
//! writes.
//!
//! ## Overview
//!
//! The credential is looked up in this order:
//!
//! 1. In-memory cache
//! 2. Platform secure store (Keychain, Credential Manager, Secret Service)
//! 3. Host prompt, through [`bridge_traits::CredentialPrompt`]
//!
//! A credential obtained from the prompt is persisted before it is returned.
//! When the remote rejects the credential, [`CredentialManager::invalidate`]
//! drops it from both the cache and the secure store so that the next push
//! prompts again. A rejection that arrives after the credential was replaced
//! leaves the replacement alone.

pub mod credential_store;
pub mod error;
pub mod manager;
pub mod types;

pub use credential_store::CredentialStore;
pub use error::{AuthError, Result};
pub use manager::CredentialManager;
pub use types::{BearerCredential, CredentialSource};
