//! Mediagrab Core Library
//!
//! This library discovers and retrieves the media assets (images, video,
//! audio) referenced by a single web page, classifies them by type, and
//! persists them to disk alongside a machine-readable manifest of outcomes.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - resilient HTTP fetching with retry, pacing, and decoding
//! - [`extract`] - reference extraction from markup, styles, and scripts
//! - [`media`] - URL resolution, extension filtering, category mapping
//! - [`pipeline`] - volume capping, download execution, manifest assembly
//!
//! The pipeline holds no process-wide state; a [`RunConfig`] value drives one
//! run end to end, so repeated or concurrent runs cannot cross-contaminate.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod extract;
pub mod fetch;
pub mod media;
pub mod pipeline;

mod user_agent;

// Re-export commonly used types
pub use config::{
    DEFAULT_CAP_THRESHOLD, DEFAULT_CONCURRENCY, DEFAULT_DOWNLOAD_DELAY_MS, DEFAULT_PROBE_DELAY_MS,
    DEFAULT_RETRY_BUDGET, RunConfig,
};
pub use fetch::{
    FailureType, FetchError, FetchKind, FetchedBody, PageFetcher, RateLimiter, RetryDecision,
    RetryPolicy, classify_error,
};
pub use media::{MediaCategory, MediaItem};
pub use pipeline::{
    EntryStatus, Manifest, ManifestEntry, PipelineError, RunOutcome, RunSummary, run,
};
