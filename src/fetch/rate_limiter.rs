//! Per-origin request pacing.
//!
//! The pipeline spaces its requests per origin so a run never hammers a
//! single server, whichever worker issues them. Callers pass the minimum
//! spacing at each call site — size probes and downloads use different
//! paces — so one shared [`RateLimiter`] serves the whole run.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use mediagrab_core::fetch::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new();
//!
//! // First request to an origin proceeds immediately
//! limiter.acquire("https://example.com/a.jpg", Duration::from_millis(100)).await;
//!
//! // Second request to the same origin waits out the spacing
//! limiter.acquire("https://example.com/b.jpg", Duration::from_millis(100)).await;
//!
//! // A different origin is not delayed
//! limiter.acquire("https://other.com/c.jpg", Duration::from_millis(100)).await;
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Cap on server-mandated delays (from Retry-After) so a hostile or confused
/// origin cannot stall a run for hours.
const MAX_SERVER_DELAY: Duration = Duration::from_secs(3600);

/// Per-origin pacing gate.
///
/// Safe to wrap in `Arc` and share across tasks. Requests to distinct
/// origins never wait on each other; the mutex guarding an origin's
/// next-ready instant is held across the sleep so concurrent workers queue
/// up behind it and stay properly spaced.
#[derive(Debug, Default)]
pub struct RateLimiter {
    origins: DashMap<String, Arc<Mutex<Option<Instant>>>>,
}

impl RateLimiter {
    /// Creates an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until a request to `url`'s origin is allowed, then reserves the
    /// next `min_delay` window.
    ///
    /// The first request to an origin proceeds immediately. A zero
    /// `min_delay` disables spacing for that call site.
    pub async fn acquire(&self, url: &str, min_delay: Duration) {
        let origin = origin_of(url);
        let slot = self
            .origins
            .entry(origin.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        // DashMap shard lock released above; only the per-origin mutex is
        // held across the sleep.
        let mut next_ready = slot.lock().await;
        let now = Instant::now();
        if let Some(ready_at) = *next_ready
            && ready_at > now
        {
            let wait = ready_at - now;
            debug!(origin = %origin, wait_ms = wait.as_millis(), "pacing request");
            tokio::time::sleep(wait).await;
        }
        *next_ready = Some(Instant::now() + min_delay);
    }

    /// Records a server-mandated delay (from a Retry-After header) so later
    /// requests to the origin respect it. Delays are capped at one hour and
    /// never shorten an existing reservation.
    pub async fn note_server_delay(&self, url: &str, delay: Duration) {
        let origin = origin_of(url);
        let capped = if delay > MAX_SERVER_DELAY {
            warn!(
                origin = %origin,
                requested_secs = delay.as_secs(),
                "server-mandated delay exceeds maximum, capping at 1 hour"
            );
            MAX_SERVER_DELAY
        } else {
            delay
        };

        let slot = self
            .origins
            .entry(origin.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();
        let mut next_ready = slot.lock().await;
        let candidate = Instant::now() + capped;
        if next_ready.is_none_or(|current| candidate > current) {
            debug!(origin = %origin, delay_ms = capped.as_millis(), "recorded server delay");
            *next_ready = Some(candidate);
        }
    }
}

/// Extracts the pacing key for a URL: its ASCII origin
/// (`scheme://host:port`). Malformed URLs share the `"unknown"` bucket so
/// they are still paced.
#[must_use]
pub fn origin_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .filter(|u| u.has_host())
        .map_or_else(|| "unknown".to_string(), |u| u.origin().ascii_serialization())
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports both RFC 7231 forms: integer seconds and HTTP-date. Returns
/// `None` for unparseable values; dates in the past yield zero.
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            return None;
        }
        #[allow(clippy::cast_sign_loss)]
        return Some(Duration::from_secs(seconds as u64).min(MAX_SERVER_DELAY));
    }

    let datetime = httpdate::parse_http_date(header_value).ok()?;
    match datetime.duration_since(std::time::SystemTime::now()) {
        Ok(duration) => Some(duration.min(MAX_SERVER_DELAY)),
        // Date already passed
        Err(_) => Some(Duration::ZERO),
    }
}
