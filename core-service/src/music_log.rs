//! # Album Log Façade
//!
//! [`MusicLog`] owns the in-memory collection and drives its side effects.
//! Every mutation runs under one async lock, in order:
//!
//! 1. Apply the change to the [`RecordStore`]
//! 2. Write the whole collection to the [`LocalCache`] (awaited)
//! 3. Schedule a remote push on the [`PushQueue`] (background)
//!
//! A failed cache write is returned inside [`Committed`]; the mutation
//! stands. Push results arrive through the [`PushTicket`] and the event bus
//! and never roll anything back.

use bridge_traits::blob::VersionedBlobStore;
use chrono::NaiveDate;
use core_auth::{BearerCredential, CredentialManager, CredentialStore};
use core_library::{
    available_genres, query, sanitize_records, AlbumDraft, AlbumId, AlbumRecord,
    AnalyticsReport, LibraryError, LocalCache, QueryCriteria, RecordStore,
};
use core_metadata::{proxied_image_url, ImportedAlbum};
use core_runtime::config::CoreConfig;
use core_runtime::events::{
    BootstrapOrigin, CacheEvent, CoreEvent, EventBus, LibraryEvent, Receiver, SyncEvent,
    DEFAULT_EVENT_BUFFER_SIZE,
};
use core_sync::{PushOutcome, PushQueue, PushTicket, RemoteSyncAdapter};
use provider_github::GitHubContentsConnector;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{CoreError, Result};

/// Where the collection came from at startup.
pub type BootstrapSource = BootstrapOrigin;

/// A mutation that has been applied in memory.
#[derive(Debug)]
pub struct Committed<T> {
    /// Result of the mutation
    pub value: T,
    /// Set when the local cache could not be written
    pub cache_error: Option<LibraryError>,
    /// Push covering this mutation, when remote sync is enabled
    pub push: Option<PushTicket>,
}

impl<T> Committed<T> {
    pub fn is_cached(&self) -> bool {
        self.cache_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

pub struct MusicLog {
    store: Mutex<RecordStore>,
    cache: LocalCache,
    remote: Option<Arc<RemoteSyncAdapter>>,
    queue: Option<PushQueue>,
    credentials: Arc<CredentialManager>,
    event_bus: EventBus,
    image_proxy_url: String,
    source: BootstrapSource,
}

impl MusicLog {
    /// Build the core from `config` and load the initial collection.
    ///
    /// The remote document is the GitHub file described by `config.remote`.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        Self::bootstrap_with_event_bus(config, EventBus::new(DEFAULT_EVENT_BUFFER_SIZE)).await
    }

    /// Same as [`bootstrap`](Self::bootstrap), publishing on an existing bus.
    pub async fn bootstrap_with_event_bus(config: CoreConfig, event_bus: EventBus) -> Result<Self> {
        let remote = if config.features.uses_remote() {
            Some(github_store(&config)?)
        } else {
            None
        };
        Self::assemble(config, remote, event_bus).await
    }

    /// Bootstrap against any versioned document store.
    pub async fn bootstrap_with_remote(
        config: CoreConfig,
        remote: Arc<dyn VersionedBlobStore>,
        event_bus: EventBus,
    ) -> Result<Self> {
        Self::assemble(config, Some(remote), event_bus).await
    }

    #[instrument(skip_all, fields(remote = remote.is_some()))]
    async fn assemble(
        config: CoreConfig,
        remote: Option<Arc<dyn VersionedBlobStore>>,
        event_bus: EventBus,
    ) -> Result<Self> {
        let credentials = Arc::new(CredentialManager::new(
            CredentialStore::new(config.secure_store.clone(), config.credential_key.clone()),
            config.credential_prompt.clone(),
            event_bus.clone(),
        ));

        let remote = remote.map(|store| {
            Arc::new(RemoteSyncAdapter::new(
                store,
                credentials.clone(),
                config.clock.clone(),
            ))
        });

        let cache = LocalCache::new(config.settings_store.clone(), config.cache_key.clone());

        let bootstrap_remote = remote
            .as_ref()
            .filter(|_| config.features.enable_remote_bootstrap);
        let (records, source) = load_initial(bootstrap_remote, &cache, &event_bus).await;

        let album_count = records.len();
        info!(source = ?source, album_count, "Collection loaded");
        let _ = event_bus.emit(CoreEvent::Sync(SyncEvent::BootstrapCompleted {
            origin: source,
            album_count,
        }));

        let queue = match &remote {
            Some(adapter) if config.features.enable_remote_sync => {
                Some(PushQueue::new(adapter.clone(), event_bus.clone()))
            }
            _ => None,
        };

        Ok(Self {
            store: Mutex::new(RecordStore::with_records(records, config.clock.clone())),
            cache,
            remote,
            queue,
            credentials,
            event_bus,
            image_proxy_url: config.image_proxy_url,
            source,
        })
    }

    pub fn bootstrap_source(&self) -> BootstrapSource {
        self.source
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Log a new album.
    #[instrument(skip(self, draft), fields(title = %draft.title, artist = %draft.artist))]
    pub async fn add(&self, draft: AlbumDraft) -> Result<Committed<AlbumRecord>> {
        let mut store = self.store.lock().await;
        let record = store.add(draft)?;

        let _ = self
            .event_bus
            .emit(CoreEvent::Library(LibraryEvent::AlbumAdded {
                album_id: record.id.to_string(),
                title: record.title.clone(),
                artist: record.artist.clone(),
            }));

        let (cache_error, push) = self.persist(&store).await;
        Ok(Committed {
            value: record,
            cache_error,
            push,
        })
    }

    /// Replace every editable field of an album.
    #[instrument(skip(self, draft), fields(id = %id))]
    pub async fn update(&self, id: &AlbumId, draft: AlbumDraft) -> Result<Committed<AlbumRecord>> {
        let mut store = self.store.lock().await;
        let record = store.update(id, draft)?;

        let _ = self
            .event_bus
            .emit(CoreEvent::Library(LibraryEvent::AlbumUpdated {
                album_id: record.id.to_string(),
            }));

        let (cache_error, push) = self.persist(&store).await;
        Ok(Committed {
            value: record,
            cache_error,
            push,
        })
    }

    /// Delete an album, returning it.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn remove(&self, id: &AlbumId) -> Result<Committed<AlbumRecord>> {
        let mut store = self.store.lock().await;
        let record = store.remove(id)?;

        let _ = self
            .event_bus
            .emit(CoreEvent::Library(LibraryEvent::AlbumRemoved {
                album_id: record.id.to_string(),
            }));

        let (cache_error, push) = self.persist(&store).await;
        Ok(Committed {
            value: record,
            cache_error,
            push,
        })
    }

    async fn persist(&self, store: &RecordStore) -> (Option<LibraryError>, Option<PushTicket>) {
        let snapshot = store.snapshot();

        let cache_error = match self.cache.save(&snapshot).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Local cache write failed");
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Cache(CacheEvent::WriteFailed {
                        message: e.to_string(),
                    }));
                Some(e)
            }
        };

        let push = match &self.queue {
            Some(queue) => Some(queue.schedule(snapshot).await),
            None => None,
        };

        (cache_error, push)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Every album in insertion order.
    pub async fn albums(&self) -> Vec<AlbumRecord> {
        self.store.lock().await.snapshot()
    }

    pub async fn get(&self, id: &AlbumId) -> Option<AlbumRecord> {
        self.store.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    /// Filtered and sorted view of the collection.
    pub async fn query(&self, criteria: &QueryCriteria) -> Vec<AlbumRecord> {
        let store = self.store.lock().await;
        query(store.load(), criteria).into_iter().cloned().collect()
    }

    /// Distinct genres for the filter control, sorted.
    pub async fn genres(&self) -> Vec<String> {
        available_genres(self.store.lock().await.load())
    }

    pub async fn analytics(&self) -> AnalyticsReport {
        AnalyticsReport::compute(self.store.lock().await.load())
    }

    /// URL to display a cover through the configured image proxy.
    pub fn cover_display_url(&self, record: &AlbumRecord) -> Option<String> {
        record
            .cover_url
            .as_deref()
            .and_then(|url| proxied_image_url(&self.image_proxy_url, url))
    }

    /// Turn a scraped album page into a draft for the add form.
    pub fn draft_from_import(
        &self,
        imported: ImportedAlbum,
        listen_date: NaiveDate,
        rating: u8,
        review: impl Into<String>,
    ) -> Result<AlbumDraft> {
        Ok(imported.into_draft(listen_date, rating, review)?)
    }

    // ------------------------------------------------------------------
    // Remote
    // ------------------------------------------------------------------

    /// Store a credential entered by the user.
    pub async fn set_credential(&self, raw: &str) -> Result<()> {
        let credential = BearerCredential::new(raw).ok_or(CoreError::BlankCredential)?;
        self.credentials.set_credential(credential).await?;
        Ok(())
    }

    pub async fn has_credential(&self) -> bool {
        self.credentials.has_credential().await
    }

    /// Read the remote collection without touching local state.
    ///
    /// `Ok(None)` when no remote is configured or the document is missing.
    pub async fn remote_snapshot(&self) -> Result<Option<Vec<AlbumRecord>>> {
        match &self.remote {
            Some(adapter) => Ok(adapter.fetch().await?),
            None => Ok(None),
        }
    }

    /// Wait until every scheduled push has finished.
    pub async fn flush(&self) -> Option<PushOutcome> {
        match &self.queue {
            Some(queue) => queue.wait_idle().await,
            None => None,
        }
    }
}

fn github_store(config: &CoreConfig) -> Result<Arc<dyn VersionedBlobStore>> {
    let target = config.remote.clone().ok_or_else(|| {
        CoreError::InitializationFailed("Remote features enabled without a target".to_string())
    })?;
    let http_client = config.http_client.clone().ok_or_else(|| {
        CoreError::Config(core_runtime::Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "Remote features need an HTTP client".to_string(),
        })
    })?;

    debug!(owner = %target.owner, repo = %target.repo, path = %target.path, "Using GitHub remote");
    Ok(Arc::new(GitHubContentsConnector::new(http_client, target)))
}

/// Remote first, then the local cache, then nothing.
///
/// Whatever is loaded is sanitized before it is used or written back.
async fn load_initial(
    remote: Option<&Arc<RemoteSyncAdapter>>,
    cache: &LocalCache,
    event_bus: &EventBus,
) -> (Vec<AlbumRecord>, BootstrapSource) {
    if let Some(adapter) = remote {
        match adapter.fetch().await.map(|found| found.map(sanitize_records)) {
            Ok(Some(records)) if !records.is_empty() => {
                if let Err(e) = cache.save(&records).await {
                    warn!(error = %e, "Could not refresh local cache from remote");
                    let _ = event_bus.emit(CoreEvent::Cache(CacheEvent::WriteFailed {
                        message: e.to_string(),
                    }));
                }
                return (records, BootstrapSource::Remote);
            }
            Ok(_) => debug!("Remote collection missing or empty"),
            Err(e) => warn!(error = %e, "Remote collection unavailable, using local cache"),
        }
    }

    let cached = sanitize_records(cache.load().await);
    if cached.is_empty() {
        (cached, BootstrapSource::Empty)
    } else {
        (cached, BootstrapSource::LocalCache)
    }
}
