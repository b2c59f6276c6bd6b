//! Environment-backed credential prompt

use async_trait::async_trait;
use bridge_traits::credential::CredentialPrompt;
use tracing::debug;

/// Default variable consulted by [`EnvCredentialPrompt`]
pub const DEFAULT_TOKEN_VAR: &str = "MUSICLOG_GITHUB_TOKEN";

/// Reads the bearer credential from an environment variable
///
/// Headless desktop runs have no dialog to ask the user, so the variable
/// stands in for the prompt. Blank values count as declined.
#[derive(Debug, Clone)]
pub struct EnvCredentialPrompt {
    var: String,
}

impl EnvCredentialPrompt {
    pub fn new() -> Self {
        Self::with_var(DEFAULT_TOKEN_VAR)
    }

    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentialPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialPrompt for EnvCredentialPrompt {
    async fn request_credential(&self) -> Option<String> {
        let value = std::env::var(&self.var).ok()?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            debug!(var = %self.var, "Credential variable is blank");
            return None;
        }
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_variable_declines() {
        let prompt = EnvCredentialPrompt::with_var("MUSICLOG_TEST_TOKEN_UNSET_7f3a");
        assert_eq!(prompt.request_credential().await, None);
    }

    #[tokio::test]
    async fn test_variable_is_trimmed() {
        std::env::set_var("MUSICLOG_TEST_TOKEN_SET_91c2", "  ghp_abc \n");
        let prompt = EnvCredentialPrompt::with_var("MUSICLOG_TEST_TOKEN_SET_91c2");
        assert_eq!(prompt.request_credential().await, Some("ghp_abc".to_string()));
    }
}
