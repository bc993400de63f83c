use thiserror::Error;

/// Centralized error type for the extraction and download capabilities
///
/// Capability failures are reported with this enum and converted into a
/// [`DownloadError`](crate::download::DownloadError) outcome at the coordinator
/// boundary, so callers never see it directly.
///
/// # Example
///
/// ```no_run
/// use ytgrab::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// IO errors (spawning yt-dlp, reading its output)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse yt-dlp JSON output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Metadata extraction failed (unsupported site, private video, bad URL)
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Download/yt-dlp errors
    #[error("Download error: {0}")]
    Download(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Helper function to convert String to AppError::Download
impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Download(err)
    }
}

/// Helper function to convert &str to AppError::Download
impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Download(err.to_string())
    }
}
