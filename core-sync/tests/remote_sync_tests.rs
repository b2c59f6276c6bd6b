//! Push and fetch behaviour of the remote sync adapter against in-memory
//! host capabilities.

use async_trait::async_trait;
use bridge_traits::blob::{BlobWrite, VersionedBlob, VersionedBlobStore};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::time::FixedClock;
use bridge_traits::{CredentialPrompt, SecureStore};
use bytes::Bytes;
use chrono::{NaiveDate, TimeZone, Utc};
use core_auth::{CredentialManager, CredentialStore};
use core_library::{codec, AlbumDraft, AlbumId, AlbumRecord};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use core_sync::{PushOutcome, PushQueue, RemoteSyncAdapter, SyncError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Rejection {
    Unauthorized,
    ServerError,
    Offline,
}

impl Rejection {
    fn to_error(self) -> BridgeError {
        match self {
            Rejection::Unauthorized => BridgeError::Unauthorized("Bad credentials".to_string()),
            Rejection::ServerError => BridgeError::Status {
                status: 500,
                message: "Server Error".to_string(),
            },
            Rejection::Offline => BridgeError::OperationFailed("connection refused".to_string()),
        }
    }
}

/// Single document with sha-style versions "v1", "v2", ...
#[derive(Default)]
struct MemoryBlobStore {
    blob: Mutex<Option<VersionedBlob>>,
    writes: Mutex<Vec<BlobWrite>>,
    credentials_seen: Mutex<Vec<Option<String>>>,
    reject_puts: Mutex<Option<Rejection>>,
    reject_fetches: Mutex<Option<Rejection>>,
    concurrent_writer: AtomicBool,
    next_version: AtomicUsize,
}

impl MemoryBlobStore {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn seed(&self, records: &[AlbumRecord]) {
        let version = self.bump();
        *self.blob.lock().await = Some(VersionedBlob {
            content: Bytes::from(codec::encode(records).unwrap()),
            version,
        });
    }

    async fn current(&self) -> Option<VersionedBlob> {
        self.blob.lock().await.clone()
    }

    fn bump(&self) -> String {
        format!("v{}", self.next_version.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl VersionedBlobStore for MemoryBlobStore {
    fn blob_name(&self) -> &str {
        "albums.json"
    }

    async fn fetch(&self, credential: Option<&str>) -> BridgeResult<Option<VersionedBlob>> {
        self.credentials_seen
            .lock()
            .await
            .push(credential.map(str::to_string));
        if let Some(rejection) = *self.reject_fetches.lock().await {
            return Err(rejection.to_error());
        }
        Ok(self.blob.lock().await.clone())
    }

    async fn put(&self, write: BlobWrite, _credential: &str) -> BridgeResult<String> {
        if let Some(rejection) = *self.reject_puts.lock().await {
            return Err(rejection.to_error());
        }

        let mut blob = self.blob.lock().await;
        if self.concurrent_writer.load(Ordering::SeqCst) {
            if let Some(existing) = blob.as_mut() {
                existing.version = self.bump();
            }
        }

        let current = blob.as_ref().map(|b| b.version.clone());
        if current != write.previous_version {
            return Err(BridgeError::Conflict(format!(
                "albums.json does not match {:?}",
                write.previous_version
            )));
        }

        let version = self.bump();
        *blob = Some(VersionedBlob {
            content: write.content.clone(),
            version: version.clone(),
        });
        self.writes.lock().await.push(write);
        Ok(version)
    }
}

#[derive(Default)]
struct MemorySecureStore {
    secrets: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
        self.secrets
            .lock()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
        Ok(self.secrets.lock().await.get(key).cloned())
    }

    async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
        self.secrets.lock().await.remove(key);
        Ok(())
    }
}

struct CountingPrompt {
    answer: Option<String>,
    calls: AtomicUsize,
}

#[async_trait]
impl CredentialPrompt for CountingPrompt {
    async fn request_credential(&self) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

struct Harness {
    blob_store: Arc<MemoryBlobStore>,
    secure_store: Arc<MemorySecureStore>,
    prompt: Arc<CountingPrompt>,
    credentials: Arc<CredentialManager>,
    adapter: Arc<RemoteSyncAdapter>,
    bus: EventBus,
}

fn harness(answer: Option<&str>) -> Harness {
    let blob_store = MemoryBlobStore::new();
    let secure_store = Arc::new(MemorySecureStore::default());
    let prompt = Arc::new(CountingPrompt {
        answer: answer.map(str::to_string),
        calls: AtomicUsize::new(0),
    });
    let bus = EventBus::new(64);

    let credentials = Arc::new(CredentialManager::new(
        CredentialStore::new(secure_store.clone(), "github-token"),
        prompt.clone(),
        bus.clone(),
    ));
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
    ));
    let adapter = Arc::new(RemoteSyncAdapter::new(
        blob_store.clone(),
        credentials.clone(),
        clock,
    ));

    Harness {
        blob_store,
        secure_store,
        prompt,
        credentials,
        adapter,
        bus,
    }
}

fn collection(titles: &[&str]) -> Vec<AlbumRecord> {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    titles
        .iter()
        .map(|title| {
            let draft = AlbumDraft::new(
                *title,
                "Artist",
                "Jazz",
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                8,
            );
            AlbumRecord::from_draft(AlbumId::new(), draft, t0)
        })
        .collect()
}

// ============================================================================
// Push
// ============================================================================

#[tokio::test]
async fn test_push_creates_remote_file() {
    let h = harness(Some("ghp_abc"));
    let records = collection(&["Kind of Blue"]);

    let outcome = h.adapter.push(&records).await;
    assert_eq!(
        outcome,
        PushOutcome::Published {
            version: "v1".to_string()
        }
    );

    let writes = h.blob_store.writes.lock().await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].previous_version, None);
    assert_eq!(writes[0].message, "Update albums.json - 09/03/2024 14:05:07");

    let stored = h.blob_store.current().await.unwrap();
    assert_eq!(codec::decode_bytes(&stored.content).unwrap(), records);
}

#[tokio::test]
async fn test_push_is_based_on_current_version() {
    let h = harness(Some("ghp_abc"));
    h.blob_store.seed(&collection(&["Old"])).await;

    let outcome = h.adapter.push(&collection(&["Old", "New"])).await;
    assert!(outcome.is_published());

    let writes = h.blob_store.writes.lock().await;
    assert_eq!(writes[0].previous_version.as_deref(), Some("v1"));
}

#[tokio::test]
async fn test_push_without_credential_is_skipped() {
    let h = harness(None);

    assert_eq!(h.adapter.push(&collection(&["A"])).await, PushOutcome::Skipped);
    assert!(h.blob_store.current().await.is_none());
    assert_eq!(h.prompt.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_credential_prompted_once_across_pushes() {
    let h = harness(Some("ghp_abc"));

    assert!(h.adapter.push(&collection(&["A"])).await.is_published());
    assert!(h.adapter.push(&collection(&["A", "B"])).await.is_published());
    assert_eq!(h.prompt.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unauthorized_push_invalidates_credential() {
    let h = harness(Some("ghp_abc"));
    *h.blob_store.reject_puts.lock().await = Some(Rejection::Unauthorized);

    let outcome = h.adapter.push(&collection(&["A"])).await;
    assert!(matches!(
        outcome,
        PushOutcome::Failed(SyncError::Authentication(_))
    ));
    assert!(!h.credentials.has_credential().await);
    assert!(h.secure_store.secrets.lock().await.is_empty());

    *h.blob_store.reject_puts.lock().await = None;
    assert!(h.adapter.push(&collection(&["A"])).await.is_published());
    assert_eq!(h.prompt.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stale_version_reports_conflict() {
    let h = harness(Some("ghp_abc"));
    let remote = collection(&["Remote"]);
    h.blob_store.seed(&remote).await;
    h.blob_store.concurrent_writer.store(true, Ordering::SeqCst);

    let outcome = h.adapter.push(&collection(&["Local"])).await;
    assert!(matches!(outcome, PushOutcome::Failed(SyncError::Conflict(_))));

    let stored = h.blob_store.current().await.unwrap();
    assert_eq!(codec::decode_bytes(&stored.content).unwrap(), remote);
    assert!(h.credentials.has_credential().await);
}

#[tokio::test]
async fn test_fetch_failures_fail_the_push() {
    let h = harness(Some("ghp_abc"));

    *h.blob_store.reject_fetches.lock().await = Some(Rejection::Offline);
    assert!(matches!(
        h.adapter.push(&collection(&["A"])).await,
        PushOutcome::Failed(SyncError::Network(_))
    ));

    *h.blob_store.reject_fetches.lock().await = Some(Rejection::ServerError);
    assert!(matches!(
        h.adapter.push(&collection(&["A"])).await,
        PushOutcome::Failed(SyncError::Remote { status: 500, .. })
    ));

    assert!(h.blob_store.writes.lock().await.is_empty());
}

// ============================================================================
// Fetch
// ============================================================================

#[tokio::test]
async fn test_fetch_never_prompts() {
    let h = harness(Some("ghp_abc"));
    let remote = collection(&["A", "B"]);
    h.blob_store.seed(&remote).await;

    assert_eq!(h.adapter.fetch().await.unwrap(), Some(remote));
    assert_eq!(h.prompt.calls.load(Ordering::SeqCst), 0);
    assert_eq!(*h.blob_store.credentials_seen.lock().await, vec![None]);
}

#[tokio::test]
async fn test_fetch_uses_known_credential() {
    let h = harness(None);
    h.secure_store
        .set_secret("github-token", b"ghp_stored")
        .await
        .unwrap();

    assert_eq!(h.adapter.fetch().await.unwrap(), None);
    assert_eq!(
        *h.blob_store.credentials_seen.lock().await,
        vec![Some("ghp_stored".to_string())]
    );
}

#[tokio::test]
async fn test_fetch_corrupt_remote_is_serialization_error() {
    let h = harness(None);
    *h.blob_store.blob.lock().await = Some(VersionedBlob {
        content: Bytes::from_static(b"<html>"),
        version: "v1".to_string(),
    });

    assert!(matches!(
        h.adapter.fetch().await,
        Err(SyncError::Serialization(_))
    ));
}

// ============================================================================
// Queue
// ============================================================================

#[tokio::test]
async fn test_queue_publishes_latest_snapshot() {
    let h = harness(Some("ghp_abc"));
    let mut events = h.bus.subscribe();
    let queue = PushQueue::new(h.adapter.clone(), h.bus.clone());

    queue.schedule(collection(&["A"])).await;
    let last = queue.schedule(collection(&["A", "B"])).await;
    assert!(last.wait().await.is_published());

    let stored = h.blob_store.current().await.unwrap();
    assert_eq!(codec::decode_bytes(&stored.content).unwrap().len(), 2);

    let mut saw_success = false;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Sync(SyncEvent::PushSucceeded { .. }) = event {
            saw_success = true;
        }
    }
    assert!(saw_success);
}

#[tokio::test]
async fn test_queue_reports_failure_kind() {
    let h = harness(Some("ghp_abc"));
    *h.blob_store.reject_puts.lock().await = Some(Rejection::ServerError);
    let mut events = h.bus.subscribe();
    let queue = PushQueue::new(h.adapter.clone(), h.bus.clone());

    let outcome = queue.schedule(collection(&["A"])).await.wait().await;
    assert!(matches!(outcome, PushOutcome::Failed(SyncError::Remote { .. })));

    let mut failure_kind = None;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Sync(SyncEvent::PushFailed { kind, .. }) = event {
            failure_kind = Some(kind);
        }
    }
    assert_eq!(failure_kind.as_deref(), Some("remote"));
}
