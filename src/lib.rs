//! Album listening log core.
//!
//! Re-exports the façade and the data types a host needs, so applications
//! can depend on `musiclog-workspace` alone. See [`MusicLog`] for the entry
//! point.

pub use core_library::{
    analytics, AlbumDraft, AlbumFormat, AlbumId, AlbumRecord, AnalyticsReport, LibraryError,
    QueryCriteria, RatingFilter, SortKey,
};
pub use core_metadata::{import, ImportedAlbum};
pub use core_runtime::config::{CoreConfig, FeatureFlags, RemoteTarget};
pub use core_runtime::events::{CoreEvent, EventBus};
pub use core_runtime::logging::{init_logging, LoggingConfig};
pub use core_service::{BootstrapSource, Committed, CoreError, MusicLog};

#[cfg(feature = "desktop-shims")]
pub use core_service::bootstrap_desktop;
