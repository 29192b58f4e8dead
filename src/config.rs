//! Run configuration for the media retrieval pipeline.
//!
//! A [`RunConfig`] carries every knob a single run needs. The pipeline keeps
//! no global state; callers construct one config per run and pass it into
//! [`crate::pipeline::run`].

use std::path::PathBuf;
use std::time::Duration;

/// Default volume-cap threshold: candidate sets larger than this are
/// narrowed to the largest images only.
pub const DEFAULT_CAP_THRESHOLD: usize = 250;

/// Default bounded worker-pool size for probing and downloading.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Maximum worker-pool size the pipeline accepts.
pub const MAX_CONCURRENCY: usize = 8;

/// Default extra attempts after a blocked (403/429) or transport failure.
pub const DEFAULT_RETRY_BUDGET: u32 = 2;

/// Default per-origin spacing between downloads, in milliseconds.
pub const DEFAULT_DOWNLOAD_DELAY_MS: u64 = 100;

/// Default per-origin spacing between size probes, in milliseconds.
pub const DEFAULT_PROBE_DELAY_MS: u64 = 50;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Absolute http/https URL of the page to scan.
    pub base_url: String,

    /// Directory the category folders and manifest are written under.
    /// Created on demand.
    pub output_dir: PathBuf,

    /// Candidate-set size above which the volume capper engages.
    pub cap_threshold: usize,

    /// Extra fetch attempts for blocked and transport-flaky responses.
    pub retry_budget: u32,

    /// Bounded worker-pool size (clamped to 1..=[`MAX_CONCURRENCY`]).
    /// `1` restores the strictly sequential baseline.
    pub concurrency: usize,

    /// Minimum per-origin spacing between downloads.
    pub download_delay: Duration,

    /// Minimum per-origin spacing between size probes.
    pub probe_delay: Duration,

    /// Whether linked stylesheets and scripts are fetched and scanned for
    /// additional references (the auxiliary extraction pass).
    pub fetch_assets: bool,
}

impl RunConfig {
    /// Creates a config with the default thresholds and pacing.
    pub fn new(base_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            output_dir: output_dir.into(),
            cap_threshold: DEFAULT_CAP_THRESHOLD,
            retry_budget: DEFAULT_RETRY_BUDGET,
            concurrency: DEFAULT_CONCURRENCY,
            download_delay: Duration::from_millis(DEFAULT_DOWNLOAD_DELAY_MS),
            probe_delay: Duration::from_millis(DEFAULT_PROBE_DELAY_MS),
            fetch_assets: true,
        }
    }

    /// Worker-pool size clamped to the supported range.
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }
}
