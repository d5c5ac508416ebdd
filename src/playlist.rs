//! Expansion of `.pls` and HLS (`.m3u8`) playlists into stream URLs.

use tracing::{debug, error, info};
use url::Url;

use crate::fetcher::Fetcher;
use crate::utils::{is_valid_stream_url, lowercase_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistKind {
    Pls,
    M3u8,
}

impl PlaylistKind {
    /// Playlist shape of `url`, or `None` for anything that should be scored
    /// as a stream directly.
    pub fn detect(url: &str) -> Option<Self> {
        let path = lowercase_path(url);
        if path.ends_with(".pls") {
            Some(Self::Pls)
        } else if path.ends_with(".m3u8") || url.to_lowercase().contains("m3u8") {
            Some(Self::M3u8)
        } else {
            None
        }
    }
}

pub struct PlaylistResolver<'a, F: Fetcher + ?Sized> {
    fetcher: &'a F,
}

impl<'a, F: Fetcher + ?Sized> PlaylistResolver<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    /// Fetches `playlist_url` and returns the stream URLs it lists, in
    /// playlist order. Fetch failures are logged and yield nothing.
    pub async fn resolve(&self, playlist_url: &str) -> Vec<String> {
        let Some(kind) = PlaylistKind::detect(playlist_url) else {
            debug!("{} is not a playlist", playlist_url);
            return Vec::new();
        };

        let content = match self.fetcher.fetch_text(playlist_url).await {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to parse playlist {}: {}", playlist_url, e);
                return Vec::new();
            }
        };

        let urls = match kind {
            PlaylistKind::Pls => parse_pls(&content),
            PlaylistKind::M3u8 => parse_m3u8(&content, playlist_url),
        };

        info!("Parsed playlist {}, found {} streams", playlist_url, urls.len());
        urls
    }
}

/// `FileN=<url>` entries of a PLS playlist.
pub fn parse_pls(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once('=')?;
            key.trim().starts_with("File").then(|| value.trim())
        })
        .filter(|value| is_valid_stream_url(value))
        .map(str::to_string)
        .collect()
}

/// Non-comment lines of an M3U8 playlist that are absolute URLs.
pub fn parse_m3u8(content: &str, playlist_url: &str) -> Vec<String> {
    let base = Url::parse(playlist_url).ok();

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| is_valid_stream_url(line))
        .filter_map(|line| {
            if line.starts_with("http") {
                return Some(line.to_string());
            }
            base.as_ref()?.join(line).ok().map(|url| url.to_string())
        })
        .collect()
}
