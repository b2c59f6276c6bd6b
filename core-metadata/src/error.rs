use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("No import link provided")]
    MissingLink,

    #[error("Unsupported import link: {0}")]
    UnsupportedLink(String),

    #[error("Imported page has no album title")]
    MissingTitle,
}

pub type Result<T> = std::result::Result<T, MetadataError>;
