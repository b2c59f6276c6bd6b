//! Error types for the GitHub provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// GitHub provider errors
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Credential missing, expired, or lacking access
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The `sha` sent with a write is no longer current
    #[error("Version conflict: {0}")]
    Conflict(String),

    /// Primary or secondary rate limit hit
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// API request returned an error
    #[error("GitHub API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, GitHubError>;

impl From<GitHubError> for BridgeError {
    fn from(error: GitHubError) -> Self {
        match error {
            GitHubError::Unauthorized(msg) => BridgeError::Unauthorized(msg),
            GitHubError::Conflict(msg) => BridgeError::Conflict(msg),
            GitHubError::RateLimited(msg) => BridgeError::Status {
                status: 429,
                message: msg,
            },
            GitHubError::ApiError {
                status_code,
                message,
            } => BridgeError::Status {
                status: status_code,
                message,
            },
            GitHubError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            GitHubError::BridgeError(e) => e,
        }
    }
}
