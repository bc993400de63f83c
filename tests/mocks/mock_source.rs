//! Scripted media source
//!
//! Returns canned metadata and simulates downloads that finish, fail, panic
//! or return without reporting a file, with an optional delay.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use ytgrab::core::AppError;
use ytgrab::download::progress::ProgressEvent;
use ytgrab::download::{DownloadRequest, MediaSource, RawMediaInfo, RawRendition};

/// How a simulated download ends
#[derive(Debug, Clone, PartialEq)]
pub enum MockDownload {
    /// Writes `<template with ext=mp4>` and reports it finished
    Finish,
    /// Reports progress, then returns `Ok(())` without a finished event
    Silent,
    /// Reports progress, then returns an error
    Fail(String),
    /// Panics mid-download
    Panic,
    /// Reports a finished file, then returns an error
    FinishThenFail,
}

#[derive(Debug)]
pub struct MockSource {
    info: Result<RawMediaInfo, String>,
    download: MockDownload,
    delay: Duration,
    extract_calls: AtomicUsize,
    download_calls: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
    requests: Mutex<Vec<DownloadRequest>>,
}

impl MockSource {
    /// Source returning [`sample_info`] and finishing downloads immediately
    pub fn new() -> Self {
        Self::with_info(sample_info())
    }

    pub fn with_info(info: RawMediaInfo) -> Self {
        Self {
            info: Ok(info),
            download: MockDownload::Finish,
            delay: Duration::ZERO,
            extract_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            peak_running: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Extraction fails with `message`
    pub fn failing_extraction(mut self, message: &str) -> Self {
        self.info = Err(message.to_string());
        self
    }

    pub fn with_download(mut self, download: MockDownload) -> Self {
        self.download = download;
        self
    }

    /// Every call blocks its worker for `delay_ms`
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    /// Highest number of downloads observed running at once
    pub fn peak_running(&self) -> usize {
        self.peak_running.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn block(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn extract_info(&self, _url: &str) -> Result<RawMediaInfo, AppError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.block();
        self.info.clone().map_err(AppError::Extraction)
    }

    fn download(&self, request: &DownloadRequest, hook: &mut dyn FnMut(ProgressEvent)) -> Result<(), AppError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(now, Ordering::SeqCst);

        hook(ProgressEvent::Downloading {
            percent: 0,
            total_bytes: Some(8_000_000),
            eta_seconds: None,
        });
        self.block();
        self.running.fetch_sub(1, Ordering::SeqCst);

        let path = PathBuf::from(request.output_template.replace("%(ext)s", "mp4"));
        match &self.download {
            MockDownload::Finish => {
                std::fs::write(&path, b"mock media")?;
                hook(ProgressEvent::Finished { path });
                Ok(())
            }
            MockDownload::Silent => Ok(()),
            MockDownload::Fail(message) => {
                hook(ProgressEvent::Error {
                    message: message.clone(),
                });
                Err(AppError::Download(message.clone()))
            }
            MockDownload::Panic => panic!("mock extractor crashed"),
            MockDownload::FinishThenFail => {
                std::fs::write(&path, b"mock media")?;
                hook(ProgressEvent::Finished { path });
                Err(AppError::Download("post-processing failed".to_string()))
            }
        }
    }
}

fn raw(id: &str, label: &str, ext: &str, codec: &str, size: Option<u64>) -> RawRendition {
    RawRendition {
        format_id: Some(id.to_string()),
        ext: Some(ext.to_string()),
        quality_label: Some(label.to_string()),
        filesize: size,
        vcodec: Some(codec.to_string()),
    }
}

/// Typical extractor output: duplicates per label, webm/vp9 variants,
/// audio-only and a format without a known size.
pub fn sample_info() -> RawMediaInfo {
    RawMediaInfo {
        title: Some("Big Buck Bunny".to_string()),
        duration: Some(596.4),
        formats: vec![
            raw("139", "low", "m4a", "none", Some(3_000_000)),
            raw("160", "144p", "mp4", "avc1.4d400c", Some(1_000_000)),
            raw("278", "144p", "webm", "vp9", Some(900_000)),
            raw("134", "360p", "mp4", "avc1.4d401e", Some(4_000_000)),
            raw("18", "360p", "mp4", "avc1.42001E", None),
            raw("136", "720p", "mp4", "avc1.64", Some(5_000_000)),
            raw("22", "720p", "mp4", "avc1.64", Some(8_000_000)),
            raw("247", "720p", "webm", "vp9", Some(20_000_000)),
            raw("298", "720p60", "mp4", "avc1.4d4020", Some(30_000_000)),
            raw("135", "480p", "mp4", "avc1.64", Some(3_000_000)),
        ],
    }
}
