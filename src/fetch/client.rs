//! Resilient HTTP fetching.
//!
//! [`PageFetcher`] performs single GET fetches with a browser-like header
//! set, bounded retries for blocked (403/429) and transport-flaky responses,
//! and Content-Encoding decoding with a raw fallback. It also offers a
//! lightweight size probe used by the volume capper.
//!
//! A fetch either yields bytes with no error, or an error with no bytes -
//! callers never receive both.

use reqwest::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, REFERER, RETRY_AFTER};
use reqwest::{Client, header};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use super::decode::decode_body;
use super::error::FetchError;
use super::rate_limiter::{RateLimiter, parse_retry_after};
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use crate::user_agent;

/// Connection timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Read timeout in seconds. Media files can be large; give them room.
const READ_TIMEOUT_SECS: u64 = 120;

/// What kind of resource a fetch targets. Asset fetches send a Referer
/// derived from the target's own origin; the root page fetch sends none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// The root page the run was pointed at.
    RootPage,
    /// Anything fetched because the root page referenced it.
    Asset,
}

/// A successfully fetched body.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Decoded response bytes.
    pub bytes: Vec<u8>,
    /// Declared Content-Type, if the server sent one.
    pub content_type: Option<String>,
}

/// HTTP fetcher with retry and decoding, designed to be created once per run
/// and shared across workers (connection pooling).
///
/// The shared [`RateLimiter`] is the same one callers pace their requests
/// with; server-mandated Retry-After delays observed here are recorded on it
/// so sibling requests to the origin back off too.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    policy: RetryPolicy,
    limiter: Arc<RateLimiter>,
}

impl PageFetcher {
    /// Creates a fetcher with the given retry policy and default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(policy: RetryPolicy, limiter: Arc<RateLimiter>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(user_agent::BROWSER_USER_AGENT)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            policy,
            limiter,
        }
    }

    /// Fetches `url` with retries for blocked and transport failures.
    ///
    /// Retry delays follow the policy's escalating schedule; a parseable
    /// Retry-After header on a 429 takes precedence over the backoff delay.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the URL is invalid, the final attempt
    /// failed at the transport level, or the final HTTP status was an error.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str, kind: FetchKind) -> Result<FetchedBody, FetchError> {
        let parsed =
            Url::parse(url).map_err(|_| FetchError::invalid_url(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(url.to_string()));
        }

        let mut attempt = 0_u32;
        loop {
            attempt += 1;
            debug!(attempt, "attempting fetch");

            match self.fetch_once(&parsed, kind).await {
                Ok(body) => return Ok(body),
                Err(error) => {
                    let failure = classify_error(&error);
                    let server_delay = if failure == FailureType::Blocked {
                        retry_after_delay(&error)
                    } else {
                        None
                    };

                    match self.policy.should_retry(failure, attempt) {
                        RetryDecision::Retry {
                            delay: backoff,
                            attempt: next_attempt,
                        } => {
                            // A server-mandated delay also paces sibling
                            // requests to this origin.
                            let delay = match server_delay {
                                Some(server) => {
                                    self.limiter
                                        .note_server_delay(parsed.as_str(), server)
                                        .await;
                                    server
                                }
                                None => backoff,
                            };
                            warn!(
                                attempt = next_attempt,
                                max_attempts = self.policy.max_attempts(),
                                delay_ms = delay.as_millis(),
                                using_retry_after = server_delay.is_some(),
                                error = %error,
                                "retrying fetch"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(%reason, "not retrying fetch");
                            return Err(error);
                        }
                    }
                }
            }
        }
    }

    /// Single attempt: send, check status, read and decode the body.
    async fn fetch_once(&self, url: &Url, kind: FetchKind) -> Result<FetchedBody, FetchError> {
        let response = self.send_get(url, kind).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);
        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);

        let raw = response
            .bytes()
            .await
            .map_err(|e| body_error(url.as_str(), e))?;
        let bytes = decode_body(encoding.as_deref(), &raw);

        Ok(FetchedBody {
            bytes,
            content_type,
        })
    }

    async fn send_get(&self, url: &Url, kind: FetchKind) -> Result<reqwest::Response, FetchError> {
        let mut request = self
            .client
            .get(url.as_str())
            .header(header::ACCEPT, user_agent::ACCEPT)
            .header(header::ACCEPT_LANGUAGE, user_agent::ACCEPT_LANGUAGE)
            .header(header::ACCEPT_ENCODING, user_agent::ACCEPT_ENCODING);

        // Assets claim the target's own origin as referer; many origins
        // refuse hotlinked media without one.
        if kind == FetchKind::Asset {
            request = request.header(REFERER, referer_for(url));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url.as_str())
            } else {
                FetchError::network(url.as_str(), e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(std::string::ToString::to_string);
            return Err(FetchError::http_status_with_retry_after(
                url.as_str(),
                status.as_u16(),
                retry_after,
            ));
        }

        Ok(response)
    }

    /// Probes the byte size of `url` without downloading it when possible.
    ///
    /// Tries a HEAD request and reads Content-Length; servers that reject or
    /// ignore HEAD get a GET whose body is counted. Probes are never
    /// retried; any failure yields `None` and the candidate is simply
    /// excluded from ranking.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn probe_size(&self, url: &str) -> Option<u64> {
        let head = self
            .client
            .head(url)
            .header(header::ACCEPT_ENCODING, "identity")
            .send()
            .await;
        if let Ok(response) = head
            && response.status().is_success()
            && let Some(length) = content_length_of(&response)
        {
            return Some(length);
        }

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT_ENCODING, "identity")
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "probe rejected");
            return None;
        }
        if let Some(length) = content_length_of(&response) {
            return Some(length);
        }
        let body = response.bytes().await.ok()?;
        Some(body.len() as u64)
    }
}

/// Body reads can still fail at the transport level (reset, timeout).
fn body_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::network(url, error)
    }
}

fn content_length_of(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

/// Referer for an asset fetch: the target's own origin with a trailing `/`.
fn referer_for(url: &Url) -> String {
    format!("{}/", url.origin().ascii_serialization())
}

/// Extracts a usable Retry-After delay from a blocked-response error.
fn retry_after_delay(error: &FetchError) -> Option<Duration> {
    let FetchError::HttpStatus {
        retry_after: Some(value),
        ..
    } = error
    else {
        return None;
    };
    parse_retry_after(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher(policy: RetryPolicy) -> PageFetcher {
        PageFetcher::new(policy, Arc::new(RateLimiter::new()))
    }

    #[test]
    fn test_fetch_invalid_url_is_rejected_before_any_io() {
        let fetcher = test_fetcher(RetryPolicy::default());
        let result =
            tokio_test::block_on(fetcher.fetch("not-a-valid-url", FetchKind::RootPage));
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn test_fetch_non_http_scheme_is_rejected() {
        let fetcher = test_fetcher(RetryPolicy::default());
        let result =
            tokio_test::block_on(fetcher.fetch("ftp://example.com/a.jpg", FetchKind::Asset));
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_retry_after_delay_is_honored_and_recorded() {
        let server = MockServer::start().await;

        // One 429 carrying Retry-After, then success
        Mock::given(method("GET"))
            .and(path("/limited.jpg"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/limited.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let limiter = Arc::new(RateLimiter::new());
        let fetcher = PageFetcher::new(RetryPolicy::with_budget(1), Arc::clone(&limiter));
        let url = format!("{}/limited.jpg", server.uri());

        let start = std::time::Instant::now();
        let result = fetcher.fetch(&url, FetchKind::Asset).await;

        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        // The 2s server delay wins over the ~1s first-retry backoff, and is
        // recorded on the shared limiter for siblings on the origin.
        assert!(
            start.elapsed() >= Duration::from_secs(2),
            "Retry-After must be waited out, elapsed: {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn test_referer_is_target_origin() {
        let url = Url::parse("https://cdn.example.com/img/a.jpg").unwrap();
        assert_eq!(referer_for(&url), "https://cdn.example.com/");

        let url = Url::parse("http://example.com:8080/a.jpg").unwrap();
        assert_eq!(referer_for(&url), "http://example.com:8080/");
    }

    #[test]
    fn test_retry_after_delay_reads_blocked_errors_only() {
        let blocked = FetchError::http_status_with_retry_after(
            "https://example.com/a.jpg",
            429,
            Some("3".to_string()),
        );
        assert_eq!(retry_after_delay(&blocked), Some(Duration::from_secs(3)));

        let plain = FetchError::http_status("https://example.com/a.jpg", 429);
        assert_eq!(retry_after_delay(&plain), None);

        let timeout = FetchError::timeout("https://example.com/a.jpg");
        assert_eq!(retry_after_delay(&timeout), None);
    }
}
