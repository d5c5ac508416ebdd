use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::Settings;
use crate::extractor::Extractor;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::playlist::{PlaylistKind, PlaylistResolver};
use crate::scorer::{AudioStream, QualityScorer};
use crate::tables::Tables;

/// Finds audio streams on a page and ranks them by estimated quality.
pub struct StreamDetector<F: Fetcher = HttpFetcher> {
    fetcher: F,
    tables: Tables,
}

impl StreamDetector<HttpFetcher> {
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_fetcher(HttpFetcher::new(settings)?)
    }
}

impl<F: Fetcher> StreamDetector<F> {
    pub fn with_fetcher(fetcher: F) -> Result<Self> {
        Ok(Self {
            fetcher,
            tables: Tables::new()?,
        })
    }

    /// Every stream found on `url`, best first. Network trouble yields an
    /// empty list rather than an error.
    pub async fn find_audio_streams(&self, url: &str) -> Vec<AudioStream> {
        info!("Analyzing URL: {}", url);

        let Some(html_content) = self.fetcher.fetch_page_content(url).await else {
            return Vec::new();
        };

        let candidates = Extractor::new(&self.tables).candidates(&html_content, url);
        let stream_urls = self.expand_playlists(candidates).await;

        let scorer = QualityScorer::new(&self.tables, &self.fetcher);
        let mut streams = Vec::with_capacity(stream_urls.len());
        for stream_url in &stream_urls {
            let stream = scorer.score(stream_url).await;
            info!("Found stream: {}", stream);
            streams.push(stream);
        }

        rank(&mut streams);
        streams
    }

    pub async fn get_best_stream(&self, url: &str) -> Option<AudioStream> {
        self.find_audio_streams(url).await.into_iter().next()
    }

    // Replaces playlists with their entries and drops repeated URLs, keeping
    // the first occurrence.
    async fn expand_playlists(&self, candidates: impl IntoIterator<Item = String>) -> Vec<String> {
        let resolver = PlaylistResolver::new(&self.fetcher);
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for candidate in candidates {
            let expanded = match PlaylistKind::detect(&candidate) {
                Some(kind) => {
                    debug!("Expanding {:?} playlist {}", kind, candidate);
                    resolver.resolve(&candidate).await
                }
                None => vec![candidate],
            };

            for url in expanded {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
        }

        urls
    }
}

/// Stable sort, best score first. Equal scores keep discovery order.
pub fn rank(streams: &mut [AudioStream]) {
    streams.sort_by(|a, b| b.quality_score.cmp(&a.quality_score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;

    const PAGE: &str = "https://music.example.com/listen";

    fn detector(fetcher: StaticFetcher) -> StreamDetector<StaticFetcher> {
        StreamDetector::with_fetcher(fetcher).unwrap()
    }

    #[tokio::test]
    async fn tag_and_link_end_to_end() {
        let fetcher = StaticFetcher::new().with_page(
            PAGE,
            r#"<html><body>
                 <audio src="track.flac"></audio>
                 <a href="mix.mp3">mix</a>
               </body></html>"#,
        );
        let streams = detector(fetcher).find_audio_streams(PAGE).await;

        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].url, "https://music.example.com/track.flac");
        assert_eq!(streams[0].format, "flac");
        assert_eq!(streams[0].quality_score, 100 + 15);
        assert_eq!(streams[1].url, "https://music.example.com/mix.mp3");
        assert_eq!(streams[1].format, "mp3");
        assert_eq!(streams[1].quality_score, 75 + 15);
    }

    #[tokio::test]
    async fn pls_is_replaced_by_its_entries() {
        let fetcher = StaticFetcher::new()
            .with_page(PAGE, r#"<p>Tune in: https://radio.example.net/live.pls</p>"#)
            .with_page(
                "https://radio.example.net/live.pls",
                "[playlist]\nFile1=https://s1.example.net/live.mp3\nFile2=https://s2.example.net/live.aac\n",
            );
        let streams = detector(fetcher).find_audio_streams(PAGE).await;

        let urls: Vec<&str> = streams.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["https://s2.example.net/live.aac", "https://s1.example.net/live.mp3"]);
    }

    #[tokio::test]
    async fn unreachable_page_is_empty() {
        let detector = detector(StaticFetcher::new());
        assert!(detector.find_audio_streams(PAGE).await.is_empty());
        assert!(detector.get_best_stream(PAGE).await.is_none());
    }

    #[tokio::test]
    async fn failed_playlist_does_not_stop_other_candidates() {
        let fetcher = StaticFetcher::new().with_page(
            PAGE,
            r#"<a href="https://cdn.example.com/a.ogg">a</a>
               <script>hls.loadSource("https://cdn.example.com/broken/index.m3u8")</script>"#,
        );
        let streams = detector(fetcher).find_audio_streams(PAGE).await;
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].format, "ogg");
    }

    #[tokio::test]
    async fn results_are_sorted_and_unique() {
        let fetcher = StaticFetcher::new()
            .with_page(
                PAGE,
                r#"<audio><source src="https://cdn.example.com/a.wma"></audio>
                   <a href="https://cdn.example.com/b_hq_1080.opus">b</a>
                   <a href="https://cdn.example.com/c-64k.mp3">c</a>
                   https://cdn.example.com/list.m3u8"#,
            )
            .with_page(
                "https://cdn.example.com/list.m3u8",
                "#EXTM3U\nhttps://cdn.example.com/a.wma\nhttps://cdn.example.com/d.flac\n",
            );
        let streams = detector(fetcher).find_audio_streams(PAGE).await;

        assert_eq!(streams.len(), 4);
        assert!(streams.windows(2).all(|w| w[0].quality_score >= w[1].quality_score));
        let unique: HashSet<&str> = streams.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(unique.len(), streams.len());
        assert_eq!(streams[0].format, "opus");
    }

    #[tokio::test]
    async fn best_stream_is_first_ranked() {
        let fetcher = StaticFetcher::new().with_page(
            PAGE,
            r#"<a href="low.wma">x</a><a href="high.wav">y</a>"#,
        );
        let best = detector(fetcher).get_best_stream(PAGE).await.unwrap();
        assert_eq!(best.url, "https://music.example.com/high.wav");
    }

    #[test]
    fn rank_keeps_order_of_ties() {
        let stream = |url: &str, quality_score| AudioStream {
            url: url.to_string(),
            format: String::new(),
            quality_score,
        };
        let mut streams = vec![stream("a", 10), stream("b", 50), stream("c", 10), stream("d", 50)];
        rank(&mut streams);
        let order: Vec<&str> = streams.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }
}
