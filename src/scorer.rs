use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::fetcher::Fetcher;
use crate::tables::Tables;

const NOMINAL_BITRATE: u64 = 128;
const HIGH_QUALITY_HINTS: &[&str] = &["hq", "high", "lossless"];
const HD_HINTS: &[&str] = &["hd", "1080", "720"];

/// A scored stream. Built once by the scorer and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioStream {
    pub url: String,
    pub format: String,
    pub quality_score: u32,
}

impl fmt::Display for AudioStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioStream(url='{}', format='{}', quality={})",
            self.url, self.format, self.quality_score
        )
    }
}

pub struct QualityScorer<'a, F: Fetcher + ?Sized> {
    tables: &'a Tables,
    fetcher: &'a F,
}

impl<'a, F: Fetcher + ?Sized> QualityScorer<'a, F> {
    pub fn new(tables: &'a Tables, fetcher: &'a F) -> Self {
        Self { tables, fetcher }
    }

    /// Scores `url`. Probes the content type only when no known extension
    /// appears in the URL.
    pub async fn score(&self, url: &str) -> AudioStream {
        let url_lower = url.to_lowercase();

        let (mut quality_score, format) = match self.extension_weight(&url_lower) {
            Some(found) => found,
            None => self.probed_weight(url).await,
        };

        quality_score += bitrate_bonus(self.advertised_bitrate(&url_lower));
        quality_score += keyword_bonus(&url_lower);

        AudioStream {
            url: url.to_string(),
            format,
            quality_score,
        }
    }

    fn extension_weight(&self, url_lower: &str) -> Option<(u32, String)> {
        self.tables
            .formats()
            .find(|(ext, _)| url_lower.contains(ext))
            .map(|(ext, weight)| (weight, ext.trim_start_matches('.').to_string()))
    }

    async fn probed_weight(&self, url: &str) -> (u32, String) {
        let Some(mime) = self.fetcher.probe_content_type(url).await else {
            return (0, String::new());
        };

        match self.tables.format_for_mime(&mime) {
            Some(format) => (self.tables.weight_for(format).unwrap_or(0), format.to_string()),
            None => {
                debug!("Content type {} of {} is not a known audio type", mime, url);
                (0, String::new())
            }
        }
    }

    fn advertised_bitrate(&self, url_lower: &str) -> u64 {
        self.tables
            .bitrate
            .captures(url_lower)
            // Only digits are captured, so a parse failure means overflow
            .map(|caps| caps[1].parse::<u64>().unwrap_or(u64::MAX))
            .unwrap_or(NOMINAL_BITRATE)
    }
}

pub fn bitrate_bonus(bitrate: u64) -> u32 {
    match bitrate {
        320.. => 30,
        256.. => 25,
        192.. => 20,
        128.. => 15,
        64.. => 10,
        _ => 5,
    }
}

pub fn keyword_bonus(url_lower: &str) -> u32 {
    let mut bonus = 0;
    if HIGH_QUALITY_HINTS.iter().any(|hint| url_lower.contains(hint)) {
        bonus += 20;
    }
    if HD_HINTS.iter().any(|hint| url_lower.contains(hint)) {
        bonus += 15;
    }
    bonus
}
