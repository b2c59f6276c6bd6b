//! # Remote Sync Adapter
//!
//! Publishes the full collection to a [`VersionedBlobStore`] and reads it
//! back at startup.
//!
//! ## Push workflow
//!
//! 1. Resolve the credential (may prompt the host once)
//! 2. Read the current version token of the remote file
//! 3. Encode the collection
//! 4. Submit a conditional write based on that token
//!
//! A rejected credential is forgotten so the next push prompts again. A
//! stale token is reported as a conflict; there is no merge and no retry.

use async_trait::async_trait;
use bridge_traits::blob::{BlobWrite, VersionedBlobStore};
use bridge_traits::error::BridgeError;
use bridge_traits::time::Clock;
use core_auth::{BearerCredential, CredentialManager};
use core_library::{codec, AlbumRecord};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SyncError};

/// Result of one push attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The remote accepted the snapshot.
    Published { version: String },
    /// No credential was available; nothing was sent.
    Skipped,
    Failed(SyncError),
}

impl PushOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, PushOutcome::Published { .. })
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            PushOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Destination of collection snapshots.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn push(&self, records: &[AlbumRecord]) -> PushOutcome;
}

pub struct RemoteSyncAdapter {
    store: Arc<dyn VersionedBlobStore>,
    credentials: Arc<CredentialManager>,
    clock: Arc<dyn Clock>,
    push_lock: Mutex<()>,
}

impl RemoteSyncAdapter {
    pub fn new(
        store: Arc<dyn VersionedBlobStore>,
        credentials: Arc<CredentialManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            credentials,
            clock,
            push_lock: Mutex::new(()),
        }
    }

    /// Change description attached to each write.
    pub fn commit_message(&self) -> String {
        format!(
            "Update {} - {}",
            self.store.blob_name(),
            self.clock.now().format("%d/%m/%Y %H:%M:%S")
        )
    }

    /// Publish a snapshot of the collection.
    ///
    /// Never returns an error: failures are carried in
    /// [`PushOutcome::Failed`].
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn push(&self, records: &[AlbumRecord]) -> PushOutcome {
        let _guard = self.push_lock.lock().await;

        let Some(credential) = self.credentials.resolve().await else {
            info!("No credential available, skipping push");
            return PushOutcome::Skipped;
        };
        let token = credential.expose();

        let previous_version = match self.store.fetch_version(Some(token)).await {
            Ok(version) => version,
            Err(e) => return self.failed(e, &credential).await,
        };
        debug!(previous_version = ?previous_version, "Read remote version");

        let content = match codec::encode(records) {
            Ok(content) => content,
            Err(e) => return PushOutcome::Failed(e.into()),
        };

        let write =
            BlobWrite::new(content.into_bytes(), self.commit_message()).based_on(previous_version);

        match self.store.put(write, token).await {
            Ok(version) => {
                info!(version = %version, "Collection published");
                PushOutcome::Published { version }
            }
            Err(e) => self.failed(e, &credential).await,
        }
    }

    async fn failed(&self, error: BridgeError, credential: &BearerCredential) -> PushOutcome {
        let error = SyncError::from(error);
        warn!(kind = error.kind(), error = %error, "Push failed");

        if let SyncError::Authentication(reason) = &error {
            self.credentials.invalidate(credential, reason).await;
        }
        PushOutcome::Failed(error)
    }

    /// Read the remote collection.
    ///
    /// Uses the credential only if one is already known; never prompts.
    /// `Ok(None)` means the remote file does not exist.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Option<Vec<AlbumRecord>>> {
        let credential = self.credentials.peek().await;

        let Some(blob) = self
            .store
            .fetch(credential.as_ref().map(|c| c.expose()))
            .await?
        else {
            debug!("Remote file not found");
            return Ok(None);
        };

        let records = codec::decode_bytes(&blob.content)?;
        info!(count = records.len(), version = %blob.version, "Fetched remote collection");
        Ok(Some(records))
    }
}

#[async_trait]
impl SnapshotSink for RemoteSyncAdapter {
    async fn push(&self, records: &[AlbumRecord]) -> PushOutcome {
        RemoteSyncAdapter::push(self, records).await
    }
}
