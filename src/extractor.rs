// src/extractor.rs

use scraper::Html;
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

use crate::tables::Tables;
use crate::utils::is_valid_stream_url;

/// Pulls candidate stream URLs out of a fetched page.
pub struct Extractor<'a> {
    tables: &'a Tables,
}

impl<'a> Extractor<'a> {
    pub fn new(tables: &'a Tables) -> Self {
        Self { tables }
    }

    /// Union of the markup rules and the script-body pass.
    pub fn candidates(&self, html_content: &str, base_url: &str) -> BTreeSet<String> {
        let document = Html::parse_document(html_content);

        let mut urls = self.from_html(&document, html_content, base_url);
        urls.extend(self.from_scripts(&document));

        debug!("Extracted {} candidate(s) from {}", urls.len(), base_url);
        urls
    }

    /// Audio/source tags, audio links and raw-text pattern matches.
    pub fn from_html(&self, document: &Html, html_content: &str, base_url: &str) -> BTreeSet<String> {
        let mut urls = BTreeSet::new();

        match Url::parse(base_url) {
            Ok(base) => {
                self.tag_sources(document, &base, &mut urls);
                self.audio_links(document, &base, &mut urls);
            }
            Err(e) => debug!("Base URL {} unusable for relative links: {}", base_url, e),
        }

        self.pattern_matches(html_content, &mut urls);
        urls
    }

    /// Pattern matches restricted to inline `<script>` bodies.
    pub fn from_scripts(&self, document: &Html) -> BTreeSet<String> {
        let mut urls = BTreeSet::new();

        for script in document.select(&self.tables.script_selector) {
            let body: String = script.text().collect();
            if !body.trim().is_empty() {
                self.pattern_matches(&body, &mut urls);
            }
        }

        urls
    }

    fn tag_sources(&self, document: &Html, base: &Url, urls: &mut BTreeSet<String>) {
        for audio in document.select(&self.tables.audio_selector) {
            if let Some(src) = audio.value().attr("src") {
                push_joined(base, src, urls);
            }
            for source in audio.select(&self.tables.source_selector) {
                if let Some(src) = source.value().attr("src") {
                    push_joined(base, src, urls);
                }
            }
        }
    }

    fn audio_links(&self, document: &Html, base: &Url, urls: &mut BTreeSet<String>) {
        for link in document.select(&self.tables.link_selector) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if let Ok(target) = base.join(href.trim()) {
                if self.tables.has_audio_extension(target.path()) {
                    urls.insert(target.to_string());
                }
            }
        }
    }

    fn pattern_matches(&self, text: &str, urls: &mut BTreeSet<String>) {
        for pattern in &self.tables.stream_patterns {
            for found in pattern.find_iter(text) {
                let candidate = found.as_str();
                if is_valid_stream_url(candidate) {
                    urls.insert(candidate.to_string());
                }
            }
        }
    }
}

fn push_joined(base: &Url, reference: &str, urls: &mut BTreeSet<String>) {
    let reference = reference.trim();
    if reference.is_empty() {
        return;
    }
    match base.join(reference) {
        Ok(url) => {
            urls.insert(url.to_string());
        }
        Err(e) => debug!("Dropping unresolvable source {}: {}", reference, e),
    }
}
