//! # Import & Presentation Helpers
//!
//! Pure helpers that sit between the host UI and the record store:
//! - Album page import cleanup ([`import`])
//! - Cover display through an image proxy ([`artwork`])

pub mod artwork;
pub mod error;
pub mod import;

pub use artwork::{proxied_image_url, DEFAULT_IMAGE_PROXY};
pub use error::{MetadataError, Result};
pub use import::{map_genre, validate_import_link, ImportedAlbum};
