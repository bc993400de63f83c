use thiserror::Error;

/// Outcome of a coordinator operation that did not produce a result.
///
/// Every failure crossing the coordinator boundary is one of these variants;
/// raw capability errors are folded into them and logged, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// Extraction produced nothing usable (bad URL, unsupported site,
    /// no renditions surviving selection)
    #[error("media not found")]
    NotFound,
    /// The requester already has a download in flight
    #[error("a download is already in progress for this requester")]
    AlreadyInProgress,
    /// The download capability failed or returned without reporting a finished file
    #[error("download failed: {0}")]
    DownloadFailed(String),
}

impl DownloadError {
    /// Returns subcategory for log lines
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::NotFound => "not_found",
            DownloadError::AlreadyInProgress => "already_in_progress",
            DownloadError::DownloadFailed(_) => "download_failed",
        }
    }

    /// Whether a later attempt at the same request could succeed.
    ///
    /// Only `DownloadFailed` qualifies, and only as a possibility: it also
    /// covers permanent causes (malformed URL, coordinator shut down), so a
    /// caller that retries must bound its attempts. `NotFound` and
    /// `AlreadyInProgress` are surfaced to the user instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DownloadError::DownloadFailed(_))
    }
}
