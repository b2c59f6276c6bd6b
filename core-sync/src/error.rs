use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Why a push or remote read failed.
///
/// `Clone` so one outcome can be handed to every waiting ticket.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Remote rejected the credential: {0}")]
    Authentication(String),

    #[error("Remote file changed since it was read: {0}")]
    Conflict(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote error (status {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Push queue stopped before the snapshot was sent")]
    QueueClosed,
}

impl SyncError {
    /// Short failure class used in events and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Authentication(_) => "authentication",
            SyncError::Conflict(_) => "conflict",
            SyncError::Network(_) => "network",
            SyncError::Remote { .. } => "remote",
            SyncError::Serialization(_) => "encoding",
            SyncError::QueueClosed => "closed",
        }
    }
}

impl From<BridgeError> for SyncError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Unauthorized(msg) => SyncError::Authentication(msg),
            BridgeError::Conflict(msg) => SyncError::Conflict(msg),
            BridgeError::Status { status, message } => SyncError::Remote { status, message },
            BridgeError::NotFound(msg) => SyncError::Remote {
                status: 404,
                message: msg,
            },
            other => SyncError::Network(other.to_string()),
        }
    }
}

impl From<core_library::LibraryError> for SyncError {
    fn from(error: core_library::LibraryError) -> Self {
        SyncError::Serialization(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
