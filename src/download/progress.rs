//! Progress reporting for running downloads.
//!
//! Sources report through a hook that receives [`ProgressEvent`]s on the
//! worker thread. [`ProgressState`] turns yt-dlp's `--newline` output into
//! those events.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

static MERGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\[Merger\] Merging formats into "(.+)"$"#).expect("merger regex"));

/// Event delivered to a download's progress hook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressEvent {
    Downloading {
        percent: u8,
        total_bytes: Option<u64>,
        eta_seconds: Option<u64>,
    },
    /// The media file is complete at `path`
    Finished { path: PathBuf },
    Error { message: String },
}

/// One recognised line of yt-dlp output.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressLine {
    /// `[download] Destination: <path>`
    Destination(PathBuf),
    /// `[download] <path> has already been downloaded`
    AlreadyDownloaded(PathBuf),
    /// `[Merger] Merging formats into "<path>"`, printed before the merge runs
    Merged(PathBuf),
    /// `[download]  45.2% of 10.00MiB at 500.00KiB/s ETA 00:10` while running,
    /// `[download] 100% of 10.00MiB in 00:03 at 3.00MiB/s` once the file is in place
    Percent {
        percent: u8,
        total_bytes: Option<u64>,
        eta_seconds: Option<u64>,
        /// Set only on the completion form (`in <elapsed>`, no `ETA`)
        elapsed_seconds: Option<u64>,
    },
    /// `ERROR: <message>`
    Error(String),
}

impl ProgressLine {
    /// Whether this is the line yt-dlp prints after the `.part` file has
    /// been renamed to its final name.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            ProgressLine::Percent {
                percent: 100,
                eta_seconds: None,
                elapsed_seconds: Some(_),
                ..
            }
        )
    }
}

/// Parses one line of yt-dlp output. Unrecognised lines yield `None`.
pub fn parse_line(line: &str) -> Option<ProgressLine> {
    let line = line.trim();

    if let Some(message) = line.strip_prefix("ERROR:") {
        return Some(ProgressLine::Error(message.trim().to_string()));
    }
    if let Some(caps) = MERGER_RE.captures(line) {
        return Some(ProgressLine::Merged(PathBuf::from(&caps[1])));
    }

    let rest = line.strip_prefix("[download]")?.trim();
    if let Some(path) = rest.strip_prefix("Destination:") {
        return Some(ProgressLine::Destination(PathBuf::from(path.trim())));
    }
    if let Some(path) = rest.strip_suffix("has already been downloaded") {
        return Some(ProgressLine::AlreadyDownloaded(PathBuf::from(path.trim())));
    }
    if !rest.contains('%') {
        log::trace!("Download line without percent: {}", line);
        return None;
    }

    let parts: Vec<&str> = rest.split_whitespace().collect();
    let mut percent = None;
    let mut total_bytes = None;
    let mut eta_seconds = None;
    let mut elapsed_seconds = None;
    let mut has_eta = false;

    for (i, part) in parts.iter().enumerate() {
        let next = parts.get(i + 1).copied();
        if let Some(value) = part.strip_suffix('%') {
            if let Ok(p) = value.parse::<f32>() {
                percent = Some(p.clamp(0.0, 100.0) as u8);
            }
        }
        match (*part, next) {
            ("of", Some(size)) => total_bytes = parse_size(size.trim_start_matches('~')),
            ("ETA", eta) => {
                has_eta = true;
                eta_seconds = eta.and_then(parse_eta);
            }
            ("in", Some(elapsed)) => elapsed_seconds = parse_eta(elapsed),
            _ => {}
        }
    }

    percent.map(|percent| ProgressLine::Percent {
        percent,
        total_bytes,
        eta_seconds,
        elapsed_seconds: if has_eta { None } else { elapsed_seconds },
    })
}

/// Parses sizes like `10.00MiB` or `500.00KiB/s` into bytes.
pub fn parse_size(size: &str) -> Option<u64> {
    let size = size.trim_end_matches("/s");
    let (number, multiplier) = if let Some(n) = size.strip_suffix("GiB") {
        (n, 1024.0 * 1024.0 * 1024.0)
    } else if let Some(n) = size.strip_suffix("MiB") {
        (n, 1024.0 * 1024.0)
    } else if let Some(n) = size.strip_suffix("KiB") {
        (n, 1024.0)
    } else if let Some(n) = size.strip_suffix('B') {
        (n, 1.0)
    } else {
        return None;
    };
    number.parse::<f64>().ok().map(|value| (value * multiplier) as u64)
}

/// Parses ETAs like `00:10`, `1:23` or `1:02:03` into seconds.
pub fn parse_eta(eta: &str) -> Option<u64> {
    let parts = eta
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;
    match parts.as_slice() {
        [minutes, seconds] => Some(minutes * 60 + seconds),
        [hours, minutes, seconds] => Some(hours * 3600 + minutes * 60 + seconds),
        _ => None,
    }
}

/// Line-by-line state needed to know when, and where, the output file is
/// complete.
///
/// A single-format download is finished on its completion line. When the
/// format id joins several streams (`137+140`), every stream completes on
/// its own and the merged file only exists once the merger step has run, so
/// the merged path is held back until [`ProgressState::finish`] is called
/// after yt-dlp exits successfully.
#[derive(Debug, Default)]
pub struct ProgressState {
    destination: Option<PathBuf>,
    merge_expected: bool,
    final_path: Option<PathBuf>,
    finished: bool,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for downloading `format_id`; `a+b` ids are merged by yt-dlp.
    pub fn for_format(format_id: &str) -> Self {
        Self {
            merge_expected: format_id.contains('+'),
            ..Self::default()
        }
    }

    /// Feeds one output line, returning the event it produces, if any.
    pub fn feed(&mut self, line: &str) -> Option<ProgressEvent> {
        let parsed = parse_line(line)?;
        let completion = parsed.is_completion();
        match parsed {
            ProgressLine::Destination(path) => {
                log::debug!("yt-dlp destination: {}", path.display());
                self.destination = Some(path);
                None
            }
            ProgressLine::AlreadyDownloaded(path) => {
                if self.merge_expected {
                    self.final_path = Some(path);
                    None
                } else {
                    self.finish_at(path)
                }
            }
            ProgressLine::Merged(path) => {
                log::debug!("yt-dlp merging into {}", path.display());
                self.merge_expected = true;
                self.final_path = Some(path);
                None
            }
            ProgressLine::Percent {
                percent,
                total_bytes,
                eta_seconds,
                ..
            } => {
                if completion && !self.merge_expected {
                    if let Some(path) = self.destination.take() {
                        return self.finish_at(path);
                    }
                }
                Some(ProgressEvent::Downloading {
                    percent,
                    total_bytes,
                    eta_seconds,
                })
            }
            ProgressLine::Error(message) => Some(ProgressEvent::Error { message }),
        }
    }

    /// Event for a held-back merged file. Call only after yt-dlp exited
    /// successfully.
    pub fn finish(&mut self) -> Option<ProgressEvent> {
        let path = self.final_path.take()?;
        self.finish_at(path)
    }

    fn finish_at(&mut self, path: PathBuf) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }
        self.finished = true;
        Some(ProgressEvent::Finished { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_percent_line() {
        let line = "[download]  45.2% of 10.00MiB at 500.00KiB/s ETA 00:10";
        assert_eq!(
            parse_line(line),
            Some(ProgressLine::Percent {
                percent: 45,
                total_bytes: Some(10 * 1024 * 1024),
                eta_seconds: Some(10),
                elapsed_seconds: None,
            })
        );
    }

    #[test]
    fn test_parse_completion_line() {
        let line = "[download] 100% of 2.00MiB in 00:02 at 1.00MiB/s";
        let parsed = parse_line(line);
        assert_eq!(
            parsed,
            Some(ProgressLine::Percent {
                percent: 100,
                total_bytes: Some(2 * 1024 * 1024),
                eta_seconds: None,
                elapsed_seconds: Some(2),
            })
        );
        assert!(parsed.is_some_and(|p| p.is_completion()));
    }

    #[test]
    fn test_eta_line_at_full_percent_is_not_completion() {
        let parsed = parse_line("[download] 100% of 2.00MiB at 1.00MiB/s ETA 00:00");
        assert!(matches!(
            parsed,
            Some(ProgressLine::Percent {
                percent: 100,
                eta_seconds: Some(0),
                elapsed_seconds: None,
                ..
            })
        ));
        assert!(!parsed.is_some_and(|p| p.is_completion()));
    }

    #[test]
    fn test_parse_approximate_size() {
        let line = "[download]   3.0% of ~  50.00MiB at  1.00MiB/s ETA 00:48";
        match parse_line(line) {
            Some(ProgressLine::Percent { percent, eta_seconds, .. }) => {
                assert_eq!(percent, 3);
                assert_eq!(eta_seconds, Some(48));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_destination_and_already_downloaded() {
        assert_eq!(
            parse_line("[download] Destination: /tmp/ytgrab/abc.mp4"),
            Some(ProgressLine::Destination(PathBuf::from("/tmp/ytgrab/abc.mp4")))
        );
        assert_eq!(
            parse_line("[download] /tmp/ytgrab/abc.mp4 has already been downloaded"),
            Some(ProgressLine::AlreadyDownloaded(PathBuf::from("/tmp/ytgrab/abc.mp4")))
        );
    }

    #[test]
    fn test_parse_merger_and_error() {
        assert_eq!(
            parse_line(r#"[Merger] Merging formats into "/tmp/out.mp4""#),
            Some(ProgressLine::Merged(PathBuf::from("/tmp/out.mp4")))
        );
        assert_eq!(
            parse_line("ERROR: [youtube] abc: Video unavailable"),
            Some(ProgressLine::Error("[youtube] abc: Video unavailable".to_string()))
        );
    }

    #[test]
    fn test_unrelated_lines_ignored() {
        assert_eq!(parse_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_line("[download] Downloading item 1 of 3"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("1.00KiB"), Some(1024));
        assert_eq!(parse_size("2.00MiB/s"), Some(2 * 1024 * 1024));
        assert_eq!(parse_size("1.00GiB"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_size("512B"), Some(512));
        assert_eq!(parse_size("Unknown"), None);
    }

    #[test]
    fn test_parse_eta_forms() {
        assert_eq!(parse_eta("00:10"), Some(10));
        assert_eq!(parse_eta("1:23"), Some(83));
        assert_eq!(parse_eta("1:02:03"), Some(3723));
        assert_eq!(parse_eta("Unknown"), None);
    }

    #[test]
    fn test_state_finishes_on_completion_line_only() {
        let mut state = ProgressState::for_format("136");
        assert_eq!(state.feed("[download] Destination: /tmp/a.mp4"), None);
        assert!(matches!(
            state.feed("[download]  50.0% of 1.00MiB at 1.00MiB/s ETA 00:01"),
            Some(ProgressEvent::Downloading { percent: 50, .. })
        ));
        assert!(matches!(
            state.feed("[download] 100% of 1.00MiB at 1.00MiB/s ETA 00:00"),
            Some(ProgressEvent::Downloading { percent: 100, .. })
        ));
        assert_eq!(
            state.feed("[download] 100% of 1.00MiB in 00:01 at 1.00MiB/s"),
            Some(ProgressEvent::Finished {
                path: PathBuf::from("/tmp/a.mp4")
            })
        );
        assert!(matches!(
            state.feed("[download] 100% of 1.00MiB in 00:01"),
            Some(ProgressEvent::Downloading { percent: 100, .. })
        ));
        assert_eq!(state.finish(), None);
    }

    #[test]
    fn test_state_already_downloaded_finishes() {
        let mut state = ProgressState::for_format("22");
        assert_eq!(
            state.feed("[download] /tmp/a.mp4 has already been downloaded"),
            Some(ProgressEvent::Finished {
                path: PathBuf::from("/tmp/a.mp4")
            })
        );
        assert_eq!(state.finish(), None);
    }

    #[test]
    fn test_state_holds_merged_path_until_finish() {
        let mut state = ProgressState::for_format("137+140");
        let lines = [
            "[download] Destination: /tmp/a.f137.mp4",
            "[download] 100% of 4.00MiB at 2.00MiB/s ETA 00:00",
            "[download] 100% of 4.00MiB in 00:02 at 2.00MiB/s",
            "[download] Destination: /tmp/a.f140.m4a",
            "[download] 100% of 1.00MiB in 00:01 at 1.00MiB/s",
            r#"[Merger] Merging formats into "/tmp/a.mp4""#,
        ];
        for line in lines {
            let event = state.feed(line);
            assert!(
                !matches!(event, Some(ProgressEvent::Finished { .. })),
                "finished early on {:?}",
                line
            );
        }
        assert_eq!(
            state.finish(),
            Some(ProgressEvent::Finished {
                path: PathBuf::from("/tmp/a.mp4")
            })
        );
        assert_eq!(state.finish(), None);
    }

    #[test]
    fn test_state_merger_line_switches_to_merge() {
        let mut state = ProgressState::new();
        assert_eq!(
            state.feed(r#"[Merger] Merging formats into "/tmp/a.mp4""#),
            None
        );
        assert_eq!(
            state.finish(),
            Some(ProgressEvent::Finished {
                path: PathBuf::from("/tmp/a.mp4")
            })
        );
    }

    #[test]
    fn test_state_without_destination_never_finishes_on_percent() {
        let mut state = ProgressState::new();
        assert!(matches!(
            state.feed("[download] 100% of 1.00MiB"),
            Some(ProgressEvent::Downloading { percent: 100, .. })
        ));
    }

    #[test]
    fn test_event_serializes_with_status_tag() {
        let json = serde_json::to_string(&ProgressEvent::Finished {
            path: PathBuf::from("/tmp/a.mp4"),
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"finished","path":"/tmp/a.mp4"}"#);
    }
}
