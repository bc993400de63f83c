//! Extraction and download backends.
//!
//! A [`MediaSource`] is the black box the coordinator delegates to: it turns
//! a URL into raw metadata, and a URL plus format id into a file on disk.
//! Both calls block, so the coordinator only ever invokes them on pool
//! workers.
//!
//! Built-in backend:
//! - `YtDlpSource`: runs the yt-dlp binary

pub mod ytdlp;

pub use ytdlp::YtDlpSource;

use crate::core::error::AppError;
use crate::download::progress::ProgressEvent;
use crate::download::rendition::RawMediaInfo;

/// Parameters for a single rendition download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    /// Extractor format id of the chosen rendition
    pub format_id: String,
    /// Output path template; `%(ext)s` is replaced by the backend
    pub output_template: String,
}

/// Blocking extraction/download capability.
pub trait MediaSource: Send + Sync {
    /// Human-readable name of this source (e.g. "yt-dlp")
    fn name(&self) -> &str;

    /// Fetches title, duration and the unfiltered format list for `url`.
    fn extract_info(&self, url: &str) -> Result<RawMediaInfo, AppError>;

    /// Downloads one rendition, reporting through `hook`.
    ///
    /// The completed file is announced with [`ProgressEvent::Finished`].
    /// Returning `Ok(())` without that event leaves the outcome undetermined.
    fn download(&self, request: &DownloadRequest, hook: &mut dyn FnMut(ProgressEvent)) -> Result<(), AppError>;
}
