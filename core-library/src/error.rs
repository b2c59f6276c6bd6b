use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("Invalid input: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Album already in collection: {title} by {artist}")]
    Duplicate { title: String, artist: String },

    #[error("Album not found: {id}")]
    NotFound { id: String },

    #[error("Local cache write failed: {0}")]
    CacheWrite(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LibraryError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        LibraryError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
