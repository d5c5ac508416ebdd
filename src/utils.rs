use std::process::Command;
use url::Url;

use crate::error::InputError;

// Normalizes the URL typed by the user: empty is an error, a missing scheme
// becomes https.
pub fn normalize_target_url(input: &str) -> Result<String, InputError> {
    let url = input.trim();
    if url.is_empty() {
        return Err(InputError::EmptyUrl);
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Ok(format!("https://{}", url))
    }
}

// An absolute URL with both a scheme and a host.
pub fn is_valid_stream_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| !url.scheme().is_empty() && url.has_host())
        .unwrap_or(false)
}

// Lowercased path of `url`, or the whole lowercased string when it doesn't
// parse.
pub fn lowercase_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => url.to_lowercase(),
    }
}

// Whether `program` resolves on PATH
pub fn is_program_installed(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_added_when_missing() {
        assert_eq!(normalize_target_url("example.com/radio").unwrap(), "https://example.com/radio");
        assert_eq!(normalize_target_url("http://example.com").unwrap(), "http://example.com");
        assert_eq!(normalize_target_url(" https://example.com ").unwrap(), "https://example.com");
    }

    #[test]
    fn empty_url_is_rejected() {
        assert_eq!(normalize_target_url(""), Err(InputError::EmptyUrl));
        assert_eq!(normalize_target_url("   "), Err(InputError::EmptyUrl));
    }

    #[test]
    fn stream_urls_need_scheme_and_host() {
        assert!(is_valid_stream_url("https://cdn.example.com/a.mp3"));
        assert!(is_valid_stream_url("rtmp://live.example.com/app"));
        assert!(!is_valid_stream_url("/relative/a.mp3"));
        assert!(!is_valid_stream_url("segment-001.aac"));
        assert!(!is_valid_stream_url("mailto:someone@example.com"));
    }

    #[test]
    fn path_ignores_query() {
        assert_eq!(lowercase_path("https://x.example/Live.PLS?sid=1"), "/live.pls");
        assert_eq!(lowercase_path("not a url.M3U8"), "not a url.m3u8");
    }
}
