use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, error};

use crate::config::Settings;
use crate::error::FetchError;

/// Network access used by the detector. Implementations must never panic on
/// network trouble; failures are reported through the return types.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return its body as text. Non-2xx statuses are errors.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Lowercased MIME type of `url` without parameters, if one can be had.
    async fn probe_content_type(&self, url: &str) -> Option<String>;

    async fn fetch_page_content(&self, url: &str) -> Option<String> {
        match self.fetch_text(url).await {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Failed to fetch {}: {}", url, e);
                None
            }
        }
    }
}

/// `Fetcher` backed by a single reused `reqwest` client.
pub struct HttpFetcher {
    client: Client,
    page_timeout: Duration,
    probe_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            page_timeout: settings.page_timeout(),
            probe_timeout: settings.probe_timeout(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let request_error = |source: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let resp = self
            .client
            .get(url)
            .timeout(self.page_timeout)
            .send()
            .await
            .map_err(request_error)?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.text().await.map_err(request_error)
    }

    async fn probe_content_type(&self, url: &str) -> Option<String> {
        match self.client.head(url).timeout(self.probe_timeout).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => {
                if let Some(mime) = mime_of(&resp) {
                    return Some(mime);
                }
                debug!("HEAD {} gave no content type", url);
            }
            Ok(resp) => debug!("HEAD {} returned {}", url, resp.status()),
            Err(e) => debug!("HEAD {} failed: {}", url, e),
        }

        // Only the headers are needed; dropping the response closes the
        // connection before the body is read.
        match self.client.get(url).timeout(self.probe_timeout).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => mime_of(&resp),
            Ok(resp) => {
                debug!("GET {} returned {}", url, resp.status());
                None
            }
            Err(e) => {
                debug!("GET {} failed: {}", url, e);
                None
            }
        }
    }
}

fn mime_of(resp: &Response) -> Option<String> {
    resp.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(normalize_mime)
}

/// `"Audio/MPEG; charset=x"` -> `"audio/mpeg"`. Blank values are dropped.
pub fn normalize_mime(raw: &str) -> Option<String> {
    let mime = raw.split(';').next().unwrap_or("").trim().to_lowercase();
    if mime.is_empty() { None } else { Some(mime) }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory fetcher serving canned bodies and content types.
    #[derive(Default)]
    pub struct StaticFetcher {
        pages: HashMap<String, String>,
        mimes: HashMap<String, String>,
        pub probed: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        pub fn with_mime(mut self, url: &str, mime: &str) -> Self {
            self.mimes.insert(url.to_string(), mime.to_string());
            self
        }

        pub fn probe_count(&self) -> usize {
            self.probed.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }

        async fn probe_content_type(&self, url: &str) -> Option<String> {
            self.probed.lock().unwrap().push(url.to_string());
            self.mimes.get(url).and_then(|m| normalize_mime(m))
        }
    }
}
