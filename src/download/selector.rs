//! Rendition selection: reduces a noisy extractor format list to one
//! candidate per quality label.
//!
//! Records are considered in input order. A record survives when it has a
//! format id, quality label and file size, uses the target container, has a
//! video codec starting with the target prefix, and its label looks like
//! `<digits><letter>` (`720p`). Within a label the largest file wins; on equal
//! sizes the record seen first is kept.

use once_cell::sync::Lazy;
use regex::Regex;

use super::rendition::{RawRendition, RenditionCatalog, RenditionDescriptor};
use crate::core::config;

static QUALITY_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[A-Za-z]$").expect("quality label regex"));

/// Which container and codec family are offered to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub container: String,
    pub codec_prefix: String,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            container: config::selection::TARGET_CONTAINER.to_string(),
            codec_prefix: config::selection::CODEC_PREFIX.to_string(),
        }
    }
}

impl SelectionPolicy {
    pub fn new(container: impl Into<String>, codec_prefix: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            codec_prefix: codec_prefix.into(),
        }
    }

    /// Turns a raw record into a descriptor if it passes every filter.
    pub fn admit(&self, raw: &RawRendition) -> Option<RenditionDescriptor> {
        let format_id = raw.format_id.as_deref()?;
        let quality_label = raw.quality_label.as_deref()?;
        let file_size_bytes = raw.filesize?;

        let container_ext = raw.ext.as_deref().filter(|ext| *ext == self.container)?;
        let video_codec = raw
            .vcodec
            .as_deref()
            .filter(|codec| codec.starts_with(self.codec_prefix.as_str()))?;
        if !is_quality_label(quality_label) {
            return None;
        }

        Some(RenditionDescriptor {
            format_id: format_id.to_string(),
            container_ext: container_ext.to_string(),
            quality_label: quality_label.to_string(),
            file_size_bytes,
            video_codec: video_codec.to_string(),
        })
    }
}

/// Reduces `raw` to one descriptor per quality label.
///
/// Pure and deterministic: the same input always yields the same catalog.
pub fn select(raw: &[RawRendition], policy: &SelectionPolicy) -> RenditionCatalog {
    let mut catalog = RenditionCatalog::new();

    for candidate in raw.iter().filter_map(|record| policy.admit(record)) {
        let replace = match catalog.get(&candidate.quality_label) {
            Some(best) => candidate.file_size_bytes > best.file_size_bytes,
            None => true,
        };
        if replace {
            catalog.put(candidate);
        }
    }

    log::debug!(
        "Rendition selection: {} raw formats -> {} labels (container={}, codec={}*)",
        raw.len(),
        catalog.len(),
        policy.container,
        policy.codec_prefix
    );

    catalog
}

/// Whether `label` is `<digits><letter>`, e.g. `720p` or `4k`.
pub fn is_quality_label(label: &str) -> bool {
    QUALITY_LABEL_RE.is_match(label)
}

/// Numeric sort key of a quality label: `"720p"` → `Some(720)`.
pub fn quality_rank(label: &str) -> Option<u32> {
    if !is_quality_label(label) {
        return None;
    }
    label
        .strip_suffix(|c: char| c.is_ascii_alphabetic())
        .and_then(|digits| digits.parse::<u32>().ok())
}
