//! Mock implementations for coordinator tests
//!
//! Provides a scripted media source so the coordinator can be exercised
//! without yt-dlp, network access or real media files.

pub mod mock_source;

pub use mock_source::{sample_info, MockDownload, MockSource};
