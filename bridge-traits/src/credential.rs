//! Credential Prompt
//!
//! Hosts supply the bearer credential on demand, typically by asking the user.

use async_trait::async_trait;

/// Interactive source of a bearer credential
///
/// Called at most once per resolution attempt. Returning `None` means the
/// user declined and remote sync is skipped.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    async fn request_credential(&self) -> Option<String>;
}

/// Prompt that never yields a credential
#[derive(Debug, Clone, Default)]
pub struct NoCredentialPrompt;

#[async_trait]
impl CredentialPrompt for NoCredentialPrompt {
    async fn request_credential(&self) -> Option<String> {
        None
    }
}

/// Prompt that always yields the same credential
#[derive(Clone)]
pub struct StaticCredentialPrompt {
    credential: String,
}

impl StaticCredentialPrompt {
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
        }
    }
}

impl std::fmt::Debug for StaticCredentialPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentialPrompt")
            .field("credential", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl CredentialPrompt for StaticCredentialPrompt {
    async fn request_credential(&self) -> Option<String> {
        Some(self.credential.clone())
    }
}
