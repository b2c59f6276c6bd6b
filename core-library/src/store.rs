//! In-memory record store
//!
//! Owns the album collection in insertion order. Persistence is driven by the
//! caller after each successful mutation.

use crate::error::{LibraryError, Result};
use crate::models::{AlbumDraft, AlbumId, AlbumRecord, MAX_RATING, MIN_RATING};
use bridge_traits::time::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct RecordStore {
    records: Vec<AlbumRecord>,
    clock: Arc<dyn Clock>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Vec::new(),
            clock,
        }
    }

    /// Create a store holding an existing collection.
    ///
    /// The collection is passed through [`sanitize_records`] first.
    pub fn with_records(records: Vec<AlbumRecord>, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: sanitize_records(records),
            clock,
        }
    }

    /// Replace the whole collection, sanitized like [`with_records`](Self::with_records).
    pub fn reset(&mut self, records: Vec<AlbumRecord>) {
        debug!(count = records.len(), "Resetting record store");
        self.records = sanitize_records(records);
    }

    /// Current collection in insertion order.
    pub fn load(&self) -> &[AlbumRecord] {
        &self.records
    }

    /// Owned copy of the collection.
    pub fn snapshot(&self) -> Vec<AlbumRecord> {
        self.records.clone()
    }

    pub fn get(&self, id: &AlbumId) -> Option<&AlbumRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validate and append a new album.
    ///
    /// # Errors
    ///
    /// - [`LibraryError::Validation`] for an invalid draft
    /// - [`LibraryError::Duplicate`] when the same title and artist
    ///   (case-insensitive) is already logged
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub fn add(&mut self, draft: AlbumDraft) -> Result<AlbumRecord> {
        let draft = draft.validated()?;

        if self
            .records
            .iter()
            .any(|r| r.same_album(&draft.title, &draft.artist))
        {
            return Err(LibraryError::Duplicate {
                title: draft.title,
                artist: draft.artist,
            });
        }

        let mut id = AlbumId::new();
        while self.get(&id).is_some() {
            id = AlbumId::new();
        }

        let record = AlbumRecord::from_draft(id, draft, self.clock.now());
        debug!(id = %record.id, "Album added");
        self.records.push(record.clone());
        Ok(record)
    }

    /// Replace every editable field of an existing album.
    ///
    /// Validation runs before the lookup. No duplicate check is made.
    #[instrument(skip(self, draft), fields(id = %id))]
    pub fn update(&mut self, id: &AlbumId, draft: AlbumDraft) -> Result<AlbumRecord> {
        let draft = draft.validated()?;
        let now = self.clock.now();

        let record = self
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| LibraryError::NotFound { id: id.to_string() })?;

        record.apply_draft(draft, now);
        debug!(updated_at = %record.updated_at, "Album updated");
        Ok(record.clone())
    }

    /// Remove an album, returning it.
    #[instrument(skip(self), fields(id = %id))]
    pub fn remove(&mut self, id: &AlbumId) -> Result<AlbumRecord> {
        let index = self
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| LibraryError::NotFound { id: id.to_string() })?;

        let removed = self.records.remove(index);
        debug!("Album removed");
        Ok(removed)
    }
}

/// Bring a loaded collection back within the store invariants.
///
/// Records rated outside `MIN_RATING..=MAX_RATING` are dropped. A record
/// whose id was already seen keeps its data under a fresh id. Order is
/// preserved.
pub fn sanitize_records(records: Vec<AlbumRecord>) -> Vec<AlbumRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut clean = Vec::with_capacity(records.len());

    for mut record in records {
        if !(MIN_RATING..=MAX_RATING).contains(&record.rating) {
            warn!(id = %record.id, rating = record.rating, "Dropping album with out-of-range rating");
            continue;
        }

        if seen.contains(&record.id) {
            let mut id = AlbumId::new();
            while seen.contains(&id) {
                id = AlbumId::new();
            }
            warn!(old_id = %record.id, new_id = %id, "Reassigning duplicate album id");
            record.id = id;
        }

        seen.insert(record.id.clone());
        clean.push(record);
    }

    clean
}
