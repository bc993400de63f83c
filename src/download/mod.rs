//! Download coordination and rendition selection

pub mod bridge;
pub mod coordinator;
pub mod error;
pub mod pool;
pub mod progress;
pub mod rendition;
pub mod selector;
pub mod source;
pub mod tracker;

// Re-exports for convenience
pub use coordinator::{CoordinatorConfig, DownloadCoordinator};
pub use error::DownloadError;
pub use pool::{PoolStats, ShutdownMode, WorkerPool};
pub use progress::ProgressEvent;
pub use rendition::{MediaInfo, RawMediaInfo, RawRendition, RenditionCatalog, RenditionDescriptor};
pub use selector::{select, SelectionPolicy};
pub use source::{DownloadRequest, MediaSource, YtDlpSource};
pub use tracker::{DownloadTracker, InFlightGuard, RequesterId};
