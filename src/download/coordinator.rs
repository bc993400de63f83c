//! Download coordinator: the two operations the chat layer calls.
//!
//! `fetch_info` extracts metadata on a pool worker and reduces the format
//! list to a [`RenditionCatalog`](super::rendition::RenditionCatalog).
//! `download_rendition` downloads one chosen rendition, at most one per
//! requester at a time. Both suspend the calling task on a bridge resolved
//! from the worker thread, and both return a [`DownloadError`] instead of
//! raw failures.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use super::bridge::{self, BridgeError};
use super::error::DownloadError;
use super::pool::{PoolStats, ShutdownMode, WorkerPool};
use super::progress::ProgressEvent;
use super::rendition::{MediaInfo, RawMediaInfo};
use super::selector::{self, SelectionPolicy};
use super::source::{DownloadRequest, MediaSource};
use super::tracker::{DownloadTracker, RequesterId};
use crate::core::config;

/// Per-instance coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Parallel blocking operations (extractions and downloads combined)
    pub workers: usize,
    /// Directory receiving finished files
    pub output_dir: PathBuf,
    pub policy: SelectionPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            workers: config::pool::DEFAULT_MAX_WORKERS,
            output_dir: std::env::temp_dir().join("ytgrab"),
            policy: SelectionPolicy::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Builds the configuration from `MAX_WORKERS` and `DOWNLOAD_FOLDER`.
    pub fn from_env() -> Self {
        Self {
            workers: *config::MAX_WORKERS,
            output_dir: config::DOWNLOAD_FOLDER.clone(),
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Owns the worker pool and the single-flight tracker for one media source.
pub struct DownloadCoordinator {
    source: Arc<dyn MediaSource>,
    pool: WorkerPool,
    tracker: DownloadTracker,
    policy: SelectionPolicy,
    output_dir: PathBuf,
}

impl std::fmt::Debug for DownloadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadCoordinator")
            .field("source", &self.source.name())
            .field("pool", &self.pool)
            .field("tracker", &self.tracker)
            .field("policy", &self.policy)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl DownloadCoordinator {
    pub fn new(source: Arc<dyn MediaSource>, config: CoordinatorConfig) -> Self {
        log::info!(
            "Download coordinator using {} with {} workers, output to {}",
            source.name(),
            config.workers,
            config.output_dir.display()
        );
        Self {
            source,
            pool: WorkerPool::new(config.workers),
            tracker: DownloadTracker::new(),
            policy: config.policy,
            output_dir: config.output_dir,
        }
    }

    /// Fetches metadata and the selected renditions for `url`.
    ///
    /// Every failure (unparseable or non-http URL, extraction error, no
    /// rendition surviving selection, pool shut down) is `NotFound`.
    pub async fn fetch_info(&self, url: &str) -> Result<MediaInfo, DownloadError> {
        if let Err(reason) = validate_url(url) {
            log::info!("Rejecting {:?}: {}", url, reason);
            return Err(DownloadError::NotFound);
        }

        let (pending, resolver) = bridge::pending::<Option<MediaInfo>>();
        let source = Arc::clone(&self.source);
        let policy = self.policy.clone();
        let job_url = url.to_string();

        // Detached: completion is observed through the bridge.
        let _job = self.pool.submit(move || {
            let info = match source.extract_info(&job_url) {
                Ok(raw) => build_media_info(raw, &policy),
                Err(e) => {
                    log::warn!("Extraction failed for {}: {}", job_url, e);
                    None
                }
            };
            resolver.resolve(info);
        });

        match pending.await {
            Ok(Some(info)) => {
                log::info!(
                    "Fetched {:?} ({}) with {} renditions",
                    info.title,
                    info.duration_display(),
                    info.renditions.len()
                );
                Ok(info)
            }
            Ok(None) => Err(DownloadError::NotFound),
            Err(BridgeError::Abandoned) => {
                log::warn!("Extraction for {} ended without a result", url);
                Err(DownloadError::NotFound)
            }
        }
    }

    /// Downloads rendition `format_id` of `url` on behalf of `requester`.
    ///
    /// Returns `AlreadyInProgress` at once if the requester is busy. The
    /// requester is released on every exit path, including when this future
    /// is dropped; the blocking download itself keeps running in that case.
    pub async fn download_rendition(
        &self,
        url: &str,
        format_id: &str,
        requester: impl Into<RequesterId>,
    ) -> Result<PathBuf, DownloadError> {
        let requester = requester.into();
        let Some(_guard) = self.tracker.try_acquire(&requester) else {
            log::info!("Requester {} already has a download in flight", requester);
            return Err(DownloadError::AlreadyInProgress);
        };

        let result = self.run_download(url, format_id).await;
        match &result {
            Ok(path) => log::info!("Requester {} downloaded {}", requester, path.display()),
            Err(e) => log::warn!("Requester {} download failed [{}]: {}", requester, e.subcategory(), e),
        }
        result
    }

    async fn run_download(&self, url: &str, format_id: &str) -> Result<PathBuf, DownloadError> {
        validate_url(url).map_err(DownloadError::DownloadFailed)?;

        let request = DownloadRequest {
            url: url.to_string(),
            format_id: format_id.to_string(),
            output_template: output_template(&self.output_dir),
        };
        log::debug!("Dispatching download of {} format {} to {}", url, format_id, request.output_template);

        let (pending, resolver) = bridge::pending::<Result<PathBuf, DownloadError>>();
        let source = Arc::clone(&self.source);
        let output_dir = self.output_dir.clone();

        let _job = self.pool.submit(move || {
            if let Err(e) = std::fs::create_dir_all(&output_dir) {
                resolver.resolve(Err(DownloadError::DownloadFailed(format!(
                    "cannot create {}: {}",
                    output_dir.display(),
                    e
                ))));
                return;
            }

            let hook_resolver = resolver.clone();
            let mut hook = move |event: ProgressEvent| match event {
                ProgressEvent::Finished { path } => {
                    log::debug!("Download finished: {}", path.display());
                    if !hook_resolver.resolve(Ok(path)) {
                        log::debug!("Ignoring repeated finished event");
                    }
                }
                ProgressEvent::Downloading { percent, .. } => log::debug!("Download at {}%", percent),
                ProgressEvent::Error { message } => log::warn!("Download reported error: {}", message),
            };

            let fallback = match source.download(&request, &mut hook) {
                Ok(()) => "download ended without reporting a finished file".to_string(),
                Err(e) => e.to_string(),
            };
            if resolver.resolve(Err(DownloadError::DownloadFailed(fallback.clone()))) {
                log::warn!("Download of {} failed: {}", request.url, fallback);
            }
        });

        match pending.await {
            Ok(result) => result,
            Err(BridgeError::Abandoned) => Err(DownloadError::DownloadFailed(
                "download ended without a result".to_string(),
            )),
        }
    }

    /// Whether `requester` has a download in flight.
    pub fn is_busy(&self, requester: impl Into<RequesterId>) -> bool {
        self.tracker.is_busy(&requester.into())
    }

    pub fn tracker(&self) -> &DownloadTracker {
        &self.tracker
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Stops accepting work. See [`ShutdownMode`] for what happens to
    /// outstanding operations.
    pub async fn shutdown(&self, mode: ShutdownMode) {
        self.pool.shutdown(mode).await;
        log::info!("Download coordinator stopped ({} downloads in flight)", self.tracker.active_count());
    }
}

/// Accepts only absolute http(s) URLs.
fn validate_url(url: &str) -> Result<Url, String> {
    let parsed = Url::parse(url.trim()).map_err(|e| format!("invalid URL: {}", e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

/// Unique per-call output template inside `dir`.
fn output_template(dir: &Path) -> String {
    dir.join(format!("{}.%(ext)s", Uuid::new_v4().simple()))
        .to_string_lossy()
        .into_owned()
}

fn build_media_info(raw: RawMediaInfo, policy: &SelectionPolicy) -> Option<MediaInfo> {
    let renditions = selector::select(&raw.formats, policy);
    if renditions.is_empty() {
        log::info!("No usable renditions among {} formats", raw.formats.len());
        return None;
    }
    Some(MediaInfo {
        title: raw.title.unwrap_or_default(),
        duration_seconds: raw.duration.map(|d| d.max(0.0).round() as u64).unwrap_or(0),
        renditions,
    })
}
