//! Error types for the fetch module.
//!
//! Fetch errors carry the URL they occurred on; their `Display` rendering is
//! the human-readable error string that ends up in manifest entries.

use thiserror::Error;

/// Errors that can occur while fetching a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if the server sent one.
        retry_after: Option<String>,
    },

    /// The provided URL is malformed or carries an unsupported scheme.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error carrying a Retry-After header value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

// The variants require context (the URL) that `reqwest::Error` alone does not
// provide, so helper constructors are used instead of `From` impls.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_names_url() {
        let error = FetchError::timeout("https://example.com/a.jpg");
        let msg = error.to_string();
        assert!(msg.contains("timeout"), "expected 'timeout' in: {msg}");
        assert!(msg.contains("https://example.com/a.jpg"));
    }

    #[test]
    fn test_http_status_display_names_status_and_url() {
        let error = FetchError::http_status("https://example.com/a.jpg", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "expected '404' in: {msg}");
        assert!(msg.contains("https://example.com/a.jpg"));
    }

    #[test]
    fn test_http_status_retry_after_is_preserved() {
        let error = FetchError::http_status_with_retry_after(
            "https://example.com/a.jpg",
            429,
            Some("120".to_string()),
        );
        match error {
            FetchError::HttpStatus {
                status, retry_after, ..
            } => {
                assert_eq!(status, 429);
                assert_eq!(retry_after.as_deref(), Some("120"));
            }
            other => panic!("expected HttpStatus, got: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_url_display() {
        let error = FetchError::invalid_url("ftp://example.com/a.jpg");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "expected prefix in: {msg}");
        assert!(msg.contains("ftp://example.com/a.jpg"));
    }
}
