use thiserror::Error;

/// Failures while assembling the runtime: configuration, capabilities,
/// logging setup.
#[derive(Error, Debug)]
pub enum Error {
    /// A setting is missing or out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The host did not supply a bridge the enabled features need.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A default bridge could not be constructed.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
