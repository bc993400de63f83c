//! ytgrab - download coordination and rendition selection for chat bots
//!
//! A chat layer asks for a URL's metadata, shows the user one button per
//! quality, then downloads the chosen rendition. This crate owns everything
//! between those two calls: the blocking worker pool, the single-flight guard
//! per requester, and the reduction of an extractor's format list to one
//! rendition per quality label.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, and logging
//! - `download`: Worker pool, bridge, tracker, selector, and coordinator

pub mod cli;
pub mod core;
pub mod download;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use download::{
    CoordinatorConfig, DownloadCoordinator, DownloadError, MediaInfo, MediaSource, RenditionCatalog, ShutdownMode,
    YtDlpSource,
};
