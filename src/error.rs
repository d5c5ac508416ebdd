use thiserror::Error;

/// Failures at the network boundary. These never travel past the fetcher:
/// callers log them and carry on with an absent/empty result.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Problems with what the user typed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("URL cannot be empty")]
    EmptyUrl,
}
