//! Bounded retry with an escalating backoff schedule.
//!
//! Fetch failures are classified into a [`FailureType`]; only blocked
//! responses (HTTP 403/429) and transport-level failures are worth retrying.
//! Every other HTTP error status is terminal for the item. The
//! [`RetryPolicy`] turns a classification plus attempt count into a
//! [`RetryDecision`], so retry behavior is a first-class, testable unit
//! rather than inline control flow.
//!
//! # Example
//!
//! ```
//! use mediagrab_core::fetch::{FetchError, RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("https://example.com/a.jpg", 429);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => println!("giving up: {reason}"),
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::FetchError;
use crate::config::DEFAULT_RETRY_BUDGET;

/// Base delay before the first retry (~1s; the second retry waits ~2s).
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Escalation factor applied per attempt.
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Cap on a computed backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Maximum jitter added to each delay (250ms).
const MAX_JITTER: Duration = Duration::from_millis(250);

/// Classification of a fetch failure for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Transport-level failure (DNS, connect, timeout). May recover.
    Transient,

    /// Blocking or rate-limiting response (HTTP 403/429). Worth backing off
    /// and retrying; origins often relent.
    Blocked,

    /// Anything else. Retrying would not help.
    Permanent,
}

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// The attempt number the retry will be (1-indexed).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Bounded-retry policy with an escalating delay schedule.
///
/// `max_attempts` counts the initial attempt, so a retry budget of 2 extra
/// attempts is `max_attempts = 3`. Delays escalate `~1s, ~2s, ...` with a
/// little jitter, capped at [`MAX_BACKOFF`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1 + DEFAULT_RETRY_BUDGET,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy allowing `budget` extra attempts after the first.
    #[must_use]
    pub fn with_budget(budget: u32) -> Self {
        Self {
            max_attempts: 1 + budget,
        }
    }

    /// Returns the maximum number of attempts, including the initial one.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides whether the attempt that just failed should be retried.
    ///
    /// `attempt` is the 1-indexed attempt number that failed.
    #[must_use]
    pub fn should_retry(&self, failure: FailureType, attempt: u32) -> RetryDecision {
        if failure == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "retry budget exhausted");
            return RetryDecision::DoNotRetry {
                reason: format!("retry budget ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: backoff_delay(attempt),
            attempt: attempt + 1,
        }
    }
}

/// Delay before the retry following `attempt`: `base * multiplier^(n-1)`
/// capped, plus jitter so simultaneous failures do not retry in lockstep.
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = f64::from(attempt.saturating_sub(1));
    let scaled_ms = (BASE_DELAY.as_millis() as f64) * BACKOFF_MULTIPLIER.powf(exponent);
    let capped_ms = scaled_ms.min(MAX_BACKOFF.as_millis() as f64);

    let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER.as_millis() as u64);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let capped = Duration::from_millis(capped_ms as u64);
    capped + Duration::from_millis(jitter_ms)
}

/// Classifies a fetch error into a [`FailureType`].
///
/// | Error | Type |
/// |-------|------|
/// | HTTP 403, 429 | Blocked |
/// | other HTTP status | Permanent |
/// | timeout, transport | Transient |
/// | invalid URL | Permanent |
#[must_use]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::HttpStatus { status, .. } => match status {
            403 | 429 => FailureType::Blocked,
            _ => FailureType::Permanent,
        },
        FetchError::Timeout { .. } | FetchError::Network { .. } => FailureType::Transient,
        FetchError::InvalidUrl { .. } => FailureType::Permanent,
    }
}
