//! Local collection cache
//!
//! Write-through mirror of the whole collection, stored as one JSON document
//! under a single key of the host [`SettingsStore`].

use crate::codec;
use crate::error::{LibraryError, Result};
use crate::models::AlbumRecord;
use bridge_traits::storage::SettingsStore;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn SettingsStore>,
    key: String,
}

impl LocalCache {
    pub fn new(store: Arc<dyn SettingsStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrite the cached collection.
    ///
    /// # Errors
    ///
    /// Any encoding or storage failure is returned as
    /// [`LibraryError::CacheWrite`].
    #[instrument(skip(self, records), fields(key = %self.key, count = records.len()))]
    pub async fn save(&self, records: &[AlbumRecord]) -> Result<()> {
        let json = codec::encode(records).map_err(|e| LibraryError::CacheWrite(e.to_string()))?;

        self.store.set_string(&self.key, &json).await.map_err(|e| {
            warn!(error = %e, "Failed to write local cache");
            LibraryError::CacheWrite(e.to_string())
        })?;

        debug!(bytes = json.len(), "Local cache written");
        Ok(())
    }

    /// Last saved collection.
    ///
    /// Missing, unreadable, or corrupt data yields an empty collection.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn load(&self) -> Vec<AlbumRecord> {
        let raw = match self.store.get_string(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Local cache is empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Local cache unavailable");
                return Vec::new();
            }
        };

        match codec::decode(&raw) {
            Ok(records) => {
                debug!(count = records.len(), "Local cache loaded");
                records
            }
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt local cache");
                Vec::new()
            }
        }
    }

    /// Remove the cached collection.
    pub async fn clear(&self) -> Result<()> {
        self.store
            .delete(&self.key)
            .await
            .map_err(|e| LibraryError::CacheWrite(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlbumDraft, AlbumId};
    use async_trait::async_trait;
    use bridge_desktop::SqliteSettingsStore;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use chrono::{NaiveDate, TimeZone, Utc};

    struct BrokenStore;

    #[async_trait]
    impl SettingsStore for BrokenStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Err(BridgeError::OperationFailed("quota exceeded".to_string()))
        }

        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Err(BridgeError::NotAvailable("storage disabled".to_string()))
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Err(BridgeError::NotAvailable("storage disabled".to_string()))
        }
    }

    fn records() -> Vec<AlbumRecord> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 10, 20, 0, 0).unwrap();
        let draft = AlbumDraft::new(
            "Promises",
            "Floating Points",
            "Electronic",
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            9,
        )
        .with_release_year(2021);
        vec![AlbumRecord::from_draft(AlbumId::new(), draft, t0)]
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());
        let cache = LocalCache::new(store, "musiclog-albums");

        assert!(cache.load().await.is_empty());

        let records = records();
        cache.save(&records).await.unwrap();
        assert_eq!(cache.load().await, records);

        cache.clear().await.unwrap();
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_cache_loads_empty() {
        let store = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());
        store
            .set_string("musiclog-albums", "[{\"broken\"")
            .await
            .unwrap();

        let cache = LocalCache::new(store, "musiclog-albums");
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failures() {
        let cache = LocalCache::new(Arc::new(BrokenStore), "musiclog-albums");

        assert!(matches!(
            cache.save(&records()).await,
            Err(LibraryError::CacheWrite(_))
        ));
        assert!(cache.load().await.is_empty());
    }
}
