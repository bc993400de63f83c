//! YtDlpSource: download backend powered by the yt-dlp binary.
//!
//! Extraction runs `yt-dlp --dump-single-json` and parses the JSON document;
//! downloads run with `--newline` so every progress update arrives as its own
//! stdout line.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use crate::core::config;
use crate::core::error::AppError;
use crate::download::progress::{ProgressEvent, ProgressState};
use crate::download::rendition::RawMediaInfo;
use crate::download::source::{DownloadRequest, MediaSource};

/// How many stderr lines are kept for error reports.
const STDERR_TAIL_LINES: usize = 200;

#[derive(Debug, Clone)]
pub struct YtDlpSource {
    bin: String,
}

impl Default for YtDlpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpSource {
    /// Uses the binary configured in `YTDL_BIN`.
    pub fn new() -> Self {
        Self::with_binary(config::YTDL_BIN.as_str())
    }

    pub fn with_binary(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn binary(&self) -> &str {
        &self.bin
    }
}

impl MediaSource for YtDlpSource {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn extract_info(&self, url: &str) -> Result<RawMediaInfo, AppError> {
        let args = extract_args(url);
        log::debug!("yt-dlp command: {} {}", self.bin, args.join(" "));

        let output = Command::new(&self.bin)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| AppError::Extraction(format!("Failed to start '{}': {}", self.bin, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = last_error_line(&stderr).unwrap_or("no error output");
            log::warn!("yt-dlp extraction failed for {}: {}", url, reason);
            return Err(AppError::Extraction(reason.to_string()));
        }

        let info: RawMediaInfo = serde_json::from_slice(&output.stdout)?;
        log::info!(
            "yt-dlp extracted {:?} with {} formats",
            info.title.as_deref().unwrap_or("untitled"),
            info.formats.len()
        );
        Ok(info)
    }

    fn download(&self, request: &DownloadRequest, hook: &mut dyn FnMut(ProgressEvent)) -> Result<(), AppError> {
        if request.format_id.trim().is_empty() {
            return Err(AppError::Validation("empty format id".to_string()));
        }
        let args = download_args(request);
        log::debug!("yt-dlp command: {} {}", self.bin, args.join(" "));

        let mut child = Command::new(&self.bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::Download(format!("Failed to start '{}': {}", self.bin, e)))?;

        let stderr_lines = Arc::new(Mutex::new(VecDeque::<String>::new()));
        let stderr_reader = child.stderr.take().map(|stream| {
            let lines = Arc::clone(&stderr_lines);
            std::thread::spawn(move || {
                for line in BufReader::new(stream).lines().map_while(Result::ok) {
                    log::debug!("yt-dlp stderr: {}", line);
                    if let Ok(mut tail) = lines.lock() {
                        tail.push_back(line);
                        if tail.len() > STDERR_TAIL_LINES {
                            tail.pop_front();
                        }
                    }
                }
            })
        });

        let mut state = ProgressState::for_format(&request.format_id);
        if let Some(stdout) = child.stdout.take() {
            relay_output(BufReader::new(stdout), &mut state, hook);
        }

        let status = child.wait()?;
        if let Some(reader) = stderr_reader {
            if reader.join().is_err() {
                log::warn!("yt-dlp stderr reader panicked");
            }
        }

        if status.success() {
            // Merged output only exists once yt-dlp has exited
            if let Some(event) = state.finish() {
                hook(event);
            }
            return Ok(());
        }

        let stderr_text = stderr_lines
            .lock()
            .map(|mut tail| tail.make_contiguous().join("\n"))
            .unwrap_or_default();
        let message = last_error_line(&stderr_text)
            .map(str::to_string)
            .unwrap_or_else(|| format!("yt-dlp exited with {}", status));
        hook(ProgressEvent::Error {
            message: message.clone(),
        });
        log::error!("yt-dlp download of {} failed: {}", request.url, message);
        Err(AppError::Download(message))
    }
}

fn extract_args(url: &str) -> Vec<String> {
    ["--dump-single-json", "--no-playlist", "--no-warnings", url]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn download_args(request: &DownloadRequest) -> Vec<String> {
    [
        "-f",
        request.format_id.as_str(),
        "-o",
        request.output_template.as_str(),
        "--newline",
        "--no-playlist",
        "--no-warnings",
        request.url.as_str(),
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Feeds every stdout line through `state` into `hook`.
fn relay_output<R: BufRead>(reader: R, state: &mut ProgressState, hook: &mut dyn FnMut(ProgressEvent)) {
    for line in reader.lines().map_while(Result::ok) {
        log::trace!("yt-dlp stdout: {}", line);
        if let Some(event) = state.feed(&line) {
            if let ProgressEvent::Downloading { percent, .. } = &event {
                log::debug!("yt-dlp progress: {}%", percent);
            }
            hook(event);
        }
    }
}

/// Last `ERROR:` line of yt-dlp's stderr, or the last non-empty line.
fn last_error_line(stderr: &str) -> Option<&str> {
    let mut lines = stderr.lines().rev().map(str::trim).filter(|l| !l.is_empty());
    let last = lines.clone().next();
    lines
        .find_map(|l| l.strip_prefix("ERROR:").map(str::trim))
        .or(last)
}
