//! # Album Library Module
//!
//! Owns the album collection and everything computed from it.
//!
//! ## Overview
//!
//! - [`store::RecordStore`]: the in-memory collection with add/update/remove
//! - [`cache::LocalCache`]: write-through copy in the host settings store
//! - [`codec`]: the JSON document shared by the cache and the remote file
//! - [`query`]: filtered and sorted views for the list screen
//! - [`analytics`]: aggregates for the statistics screen

pub mod analytics;
pub mod cache;
pub mod codec;
pub mod error;
pub mod models;
pub mod query;
pub mod store;

pub use analytics::AnalyticsReport;
pub use cache::LocalCache;
pub use error::{LibraryError, Result};
pub use models::{AlbumDraft, AlbumFormat, AlbumId, AlbumRecord};
pub use query::{available_genres, query, QueryCriteria, RatingFilter, SortKey};
pub use store::{sanitize_records, RecordStore};
