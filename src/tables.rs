//! Static lookup tables shared by the extractor, resolver and scorer.
//!
//! Everything here is built once when the detector is constructed and only
//! ever borrowed afterwards.

use anyhow::{Result, anyhow};
use regex::Regex;
use scraper::Selector;
use std::collections::HashMap;

/// Extension (with leading dot) to base quality weight. Iteration order is
/// the order the scorer tries extensions in, so lossless comes first.
const AUDIO_FORMATS: &[(&str, u32)] = &[
    (".flac", 100),
    (".wav", 100),
    (".aiff", 100),
    (".opus", 90),
    (".aac", 85),
    (".m4a", 85),
    (".ogg", 80),
    (".mp3", 75),
    (".wma", 65),
];

const CONTENT_TYPE_FORMATS: &[(&str, &str)] = &[
    ("audio/mpeg", "mp3"),
    ("audio/mp3", "mp3"),
    ("audio/aac", "aac"),
    ("audio/mp4", "aac"),
    ("audio/x-m4a", "m4a"),
    ("audio/flac", "flac"),
    ("audio/wav", "wav"),
    ("audio/wave", "wav"),
    ("audio/x-wav", "wav"),
    ("audio/ogg", "ogg"),
    ("audio/opus", "opus"),
    ("audio/x-ms-wma", "wma"),
    ("audio/aiff", "aiff"),
    ("audio/x-aiff", "aiff"),
];

const STREAM_PATTERNS: &[&str] = &[
    r#"(?i)https?://[^\s"'<>]+\.(?:mp3|flac|wav|aac|ogg|m4a|wma|opus|aiff)(?:\?[^\s"'<>]*)?"#,
    r#"(?i)https?://[^\s"'<>]*(?:audio|stream|sound)[^\s"'<>]*\.(?:mp3|flac|wav|aac|ogg|m4a|wma|opus|aiff)"#,
    r#"(?i)https?://[^\s"'<>]*\.m3u8[^\s"'<>]*"#,
    r#"(?i)https?://[^\s"'<>]*\.pls[^\s"'<>]*"#,
];

const BITRATE_PATTERN: &str = r"(?i)(\d+)k(?:bps)?";

pub struct Tables {
    formats: Vec<(&'static str, u32)>,
    content_types: HashMap<&'static str, &'static str>,
    pub stream_patterns: Vec<Regex>,
    pub bitrate: Regex,
    pub audio_selector: Selector,
    pub source_selector: Selector,
    pub link_selector: Selector,
    pub script_selector: Selector,
}

impl Tables {
    pub fn new() -> Result<Self> {
        let stream_patterns = STREAM_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            formats: AUDIO_FORMATS.to_vec(),
            content_types: CONTENT_TYPE_FORMATS.iter().copied().collect(),
            stream_patterns,
            bitrate: Regex::new(BITRATE_PATTERN)?,
            audio_selector: selector("audio")?,
            source_selector: selector("source")?,
            link_selector: selector("a[href]")?,
            script_selector: selector("script")?,
        })
    }

    /// Extensions with their weights, in priority order.
    pub fn formats(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.formats.iter().copied()
    }

    /// Weight for a bare format name such as `"flac"`.
    pub fn weight_for(&self, format: &str) -> Option<u32> {
        self.formats
            .iter()
            .find(|(ext, _)| ext.strip_prefix('.') == Some(format))
            .map(|(_, weight)| *weight)
    }

    pub fn format_for_mime(&self, mime: &str) -> Option<&'static str> {
        self.content_types.get(mime).copied()
    }

    /// True when `path` ends with one of the known audio extensions.
    pub fn has_audio_extension(&self, path: &str) -> bool {
        let path = path.to_lowercase();
        self.formats.iter().any(|(ext, _)| path.ends_with(ext))
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css}: {e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossless_outranks_lossy_in_table_order() {
        let tables = Tables::new().unwrap();
        let weights: Vec<u32> = tables.formats().map(|(_, w)| w).collect();
        let mut sorted = weights.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(weights, sorted);
        assert_eq!(tables.formats().next(), Some((".flac", 100)));
    }

    #[test]
    fn mime_lookup_and_weights() {
        let tables = Tables::new().unwrap();
        assert_eq!(tables.format_for_mime("audio/mpeg"), Some("mp3"));
        assert_eq!(tables.format_for_mime("audio/mp4"), Some("aac"));
        assert_eq!(tables.format_for_mime("video/mp4"), None);
        assert_eq!(tables.weight_for("aac"), Some(85));
        assert_eq!(tables.weight_for("webm"), None);
    }

    #[test]
    fn extension_check_ignores_case() {
        let tables = Tables::new().unwrap();
        assert!(tables.has_audio_extension("/music/Mix.MP3"));
        assert!(!tables.has_audio_extension("/music/mix.mp3.html"));
    }
}
