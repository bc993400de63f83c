//! Rendition data model: raw extractor records and the reduced catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::selector::quality_rank;

/// One format entry as reported by the extractor, before any filtering.
///
/// Field names follow yt-dlp's JSON output; every field is optional because
/// extractors routinely omit them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRendition {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    /// Human-readable quality, e.g. "720p"
    #[serde(rename = "format_note")]
    pub quality_label: Option<String>,
    pub filesize: Option<u64>,
    pub vcodec: Option<String>,
}

/// Extraction result: title, duration and the raw format list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    /// Seconds; yt-dlp reports fractional values for some sites
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub formats: Vec<RawRendition>,
}

/// A rendition that passed selection. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionDescriptor {
    pub format_id: String,
    pub container_ext: String,
    pub quality_label: String,
    pub file_size_bytes: u64,
    pub video_codec: String,
}

impl RenditionDescriptor {
    /// File size in decimal megabytes, rounded to one decimal.
    pub fn size_megabytes(&self) -> f64 {
        (self.file_size_bytes as f64 / 100_000.0).round() / 10.0
    }

    /// Caption for a selection button, e.g. `"720p (8.0 Mb)"`.
    pub fn button_caption(&self) -> String {
        format!("{} ({:.1} Mb)", self.quality_label, self.size_megabytes())
    }

    /// Numeric rank of the quality label (`"720p"` → 720).
    pub fn rank(&self) -> u32 {
        quality_rank(&self.quality_label).unwrap_or(0)
    }
}

/// One selected rendition per quality label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenditionCatalog {
    entries: HashMap<String, RenditionDescriptor>,
}

impl RenditionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, quality_label: &str) -> Option<&RenditionDescriptor> {
        self.entries.get(quality_label)
    }

    /// Looks up the entry a user picked by its format identifier.
    pub fn find_by_format_id(&self, format_id: &str) -> Option<&RenditionDescriptor> {
        self.iter().find(|d| d.format_id == format_id)
    }

    /// Entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &RenditionDescriptor> {
        self.entries.values()
    }

    /// Entries ordered by numeric quality, lowest first.
    pub fn sorted(&self) -> Vec<&RenditionDescriptor> {
        let mut sorted: Vec<&RenditionDescriptor> = self.iter().collect();
        sorted.sort_by(|a, b| a.rank().cmp(&b.rank()).then_with(|| a.quality_label.cmp(&b.quality_label)));
        sorted
    }

    /// Sorted entries grouped into rows of `width` for presentation.
    pub fn rows(&self, width: usize) -> Vec<Vec<&RenditionDescriptor>> {
        self.sorted().chunks(width.max(1)).map(<[_]>::to_vec).collect()
    }

    pub(crate) fn put(&mut self, descriptor: RenditionDescriptor) {
        self.entries.insert(descriptor.quality_label.clone(), descriptor);
    }
}

/// Metadata plus the selected renditions for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    pub duration_seconds: u64,
    pub renditions: RenditionCatalog,
}

impl MediaInfo {
    /// Duration as `m:ss` or `h:mm:ss`.
    pub fn duration_display(&self) -> String {
        let hours = self.duration_seconds / 3600;
        let minutes = (self.duration_seconds % 3600) / 60;
        let seconds = self.duration_seconds % 60;
        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{}:{:02}", minutes, seconds)
        }
    }
}
