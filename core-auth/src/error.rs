use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Stored credential is corrupted: {reason}")]
    CredentialCorrupted { reason: String },
}

pub type Result<T> = std::result::Result<T, AuthError>;
