use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The remote rejected the supplied credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A conditional write was rejected because the version token is stale.
    #[error("Version conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote answered with a non-success status not covered above.
    #[error("Remote returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure was caused by a rejected credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BridgeError::Unauthorized(_))
    }

    /// Whether the failure was a stale version token.
    pub fn is_conflict(&self) -> bool {
        matches!(self, BridgeError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
