//! Resilient HTTP fetching for pages, assets, and size probes.
//!
//! # Features
//!
//! - Browser-like header set (User-Agent, Accept headers, per-target Referer)
//! - Bounded retries for blocked (403/429) and transport-flaky responses,
//!   with Retry-After awareness
//! - Content-Encoding decoding (gzip/deflate/br) that falls back to the raw
//!   bytes when a declared encoding fails to decode
//! - Per-origin request pacing shared across workers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mediagrab_core::fetch::{FetchKind, PageFetcher, RateLimiter, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Arc::new(RateLimiter::new());
//! let fetcher = PageFetcher::new(RetryPolicy::default(), limiter);
//! let page = fetcher.fetch("https://example.com/", FetchKind::RootPage).await?;
//! println!("{} bytes, type {:?}", page.bytes.len(), page.content_type);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod decode;
mod error;
pub mod rate_limiter;
mod retry;

pub use client::{FetchKind, FetchedBody, PageFetcher};
pub use error::FetchError;
pub use rate_limiter::{RateLimiter, origin_of, parse_retry_after};
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
