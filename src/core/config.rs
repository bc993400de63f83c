use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

/// Configuration constants for the engine
/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Folder that receives finished downloads
/// Read from DOWNLOAD_FOLDER environment variable
/// Defaults to `<system temp dir>/ytgrab`. Supports tilde (~) expansion
pub static DOWNLOAD_FOLDER: Lazy<PathBuf> = Lazy::new(download_folder_from_env);

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: ytgrab.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "ytgrab.log".to_string()));

/// Log level for console and file output
/// Read from LOG_LEVEL environment variable ("error", "warn", "info", "debug", "trace")
/// Default: info
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Number of blocking worker slots
/// Read from MAX_WORKERS environment variable
pub static MAX_WORKERS: Lazy<usize> = Lazy::new(max_workers_from_env);

/// Worker pool configuration
pub mod pool {
    /// Default number of parallel blocking operations (extractions + downloads)
    pub const DEFAULT_MAX_WORKERS: usize = 3;
}

/// Rendition selection configuration
pub mod selection {
    /// Only renditions in this container are offered
    pub const TARGET_CONTAINER: &str = "mp4";

    /// Only renditions whose video codec starts with this prefix are offered (H.264/AVC)
    pub const CODEC_PREFIX: &str = "avc1";

    /// Renditions per presentation row
    pub const ROW_WIDTH: usize = 3;
}

/// Reads DOWNLOAD_FOLDER now, bypassing the cached static.
pub fn download_folder_from_env() -> PathBuf {
    match env::var("DOWNLOAD_FOLDER") {
        Ok(folder) if !folder.trim().is_empty() => expand_path(&folder),
        _ => env::temp_dir().join("ytgrab"),
    }
}

/// Reads MAX_WORKERS now, bypassing the cached static.
pub fn max_workers_from_env() -> usize {
    parse_workers(env::var("MAX_WORKERS").ok().as_deref())
}

/// Parses a worker count, falling back to the default for missing or
/// malformed values and clamping to at least one slot.
pub fn parse_workers(raw: Option<&str>) -> usize {
    match raw.map(str::trim).and_then(|value| value.parse::<usize>().ok()) {
        Some(count) => count.max(1),
        None => pool::DEFAULT_MAX_WORKERS,
    }
}

/// Expands a leading `~` in a configured path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw.trim()).to_string())
}
