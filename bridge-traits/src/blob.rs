//! Versioned Blob Storage
//!
//! A single remote document guarded by optimistic concurrency. Every read
//! returns an opaque version token; every write must present the token it
//! was based on and is rejected when the token is stale.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Remote document content together with its version token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedBlob {
    pub content: Bytes,
    pub version: String,
}

/// Conditional write request
#[derive(Debug, Clone)]
pub struct BlobWrite {
    /// New document content
    pub content: Bytes,
    /// Human-readable change description
    pub message: String,
    /// Version the write is based on, `None` when the document does not exist yet
    pub previous_version: Option<String>,
}

impl BlobWrite {
    pub fn new(content: impl Into<Bytes>, message: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message: message.into(),
            previous_version: None,
        }
    }

    pub fn based_on(mut self, version: Option<String>) -> Self {
        self.previous_version = version;
        self
    }
}

/// Remote store holding one versioned document
///
/// # Errors
///
/// Implementations map remote rejections onto
/// [`BridgeError`](crate::error::BridgeError):
/// - bad or expired credential: `Unauthorized`
/// - stale version token: `Conflict`
/// - anything else: `OperationFailed`
///
/// A missing document is not an error: `fetch` returns `Ok(None)`.
#[async_trait]
pub trait VersionedBlobStore: Send + Sync {
    /// Name of the document inside the store, used in change descriptions
    fn blob_name(&self) -> &str;

    /// Read the document and its version token
    async fn fetch(&self, credential: Option<&str>) -> Result<Option<VersionedBlob>>;

    /// Read only the current version token
    async fn fetch_version(&self, credential: Option<&str>) -> Result<Option<String>> {
        Ok(self.fetch(credential).await?.map(|blob| blob.version))
    }

    /// Submit a conditional write, returning the new version token
    async fn put(&self, write: BlobWrite, credential: &str) -> Result<String>;
}
