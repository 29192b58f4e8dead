//! Pipeline orchestration: fetch the page, extract, resolve, cap, download,
//! persist the manifest.

mod capper;
mod executor;
mod manifest;

pub use capper::{CapDecision, apply_volume_cap};
pub use executor::execute_downloads;
pub use manifest::{EntryStatus, Manifest, ManifestEntry};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::RunConfig;
use crate::extract;
use crate::fetch::{FetchError, FetchKind, PageFetcher, RateLimiter, RetryPolicy};
use crate::media::{self, MediaCategory};

/// Name of the serialized manifest inside the output directory.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Run-level failures. Per-item failures never surface here; they live in
/// the manifest.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The root URL is missing a scheme, carries a non-http scheme, or does
    /// not parse. Fatal before any fetch.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The offending input.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The root page itself could not be fetched.
    #[error("failed to fetch root page: {source}")]
    RootFetch {
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The output directory tree could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be written.
    #[error("failed to write manifest {path}: {source}")]
    ManifestWrite {
        /// The manifest path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The output directory files were placed under.
    pub output_dir: PathBuf,

    /// Path of the serialized manifest.
    pub manifest_path: PathBuf,

    /// Count of saved items.
    pub saved: usize,

    /// Count of failed items.
    pub errors: usize,

    /// Saved-item counts per category.
    pub saved_by_category: BTreeMap<MediaCategory, usize>,
}

/// Outcome of a run that did not fail at run level.
#[derive(Debug)]
pub enum RunOutcome {
    /// The download pass ran; the manifest is on disk (possibly with a 100%
    /// error rate - that is still a completed run).
    Completed(RunSummary),

    /// No downloadable media was discovered (or the oversized set held
    /// nothing the capper keeps). Informational, not an error; nothing was
    /// written.
    NoMediaFound,
}

/// Runs the whole pipeline for one configuration.
///
/// # Errors
///
/// Returns [`PipelineError`] for run-level failures only: a malformed input
/// URL, an unfetchable root page, or an unwritable output location.
pub async fn run(config: &RunConfig) -> Result<RunOutcome, PipelineError> {
    let base = parse_base_url(&config.base_url)?;
    let limiter = Arc::new(RateLimiter::new());
    let fetcher = Arc::new(PageFetcher::new(
        RetryPolicy::with_budget(config.retry_budget),
        Arc::clone(&limiter),
    ));
    let concurrency = config.effective_concurrency();

    info!(url = %base, "fetching root page");
    let page = fetcher
        .fetch(base.as_str(), FetchKind::RootPage)
        .await
        .map_err(|source| PipelineError::RootFetch { source })?;
    let html = String::from_utf8_lossy(&page.bytes).into_owned();

    // Structural and pattern passes are independent; their union (plus the
    // auxiliary pass) is the evidence set.
    let mut references = extract::structural_references(&html);
    debug!(structural = references.len(), "structural pass complete");

    if config.fetch_assets {
        let linked = extract::linked_assets(&html, &base);
        debug!(
            stylesheets = linked.stylesheets.len(),
            scripts = linked.scripts.len(),
            "scanning linked resources"
        );
        let auxiliary =
            extract::auxiliary_references(&fetcher, &limiter, &linked, config.download_delay)
                .await;
        references.extend(auxiliary);
    }

    references.extend(extract::pattern_references(&html));
    info!(references = references.len(), "extraction complete");

    let candidates =
        media::resolve_references(references.iter().map(String::as_str), &base);
    let items = media::filter_by_extension(candidates);
    if items.is_empty() {
        info!("no media candidates survived filtering");
        return Ok(RunOutcome::NoMediaFound);
    }
    info!(candidates = items.len(), "download set assembled");

    let items = match capper::apply_volume_cap(
        items,
        config.cap_threshold,
        &fetcher,
        &limiter,
        config.probe_delay,
        concurrency,
    )
    .await
    {
        CapDecision::Kept(items) | CapDecision::Capped(items) => items,
        CapDecision::NothingToDo => {
            warn!("volume capper left nothing to download");
            return Ok(RunOutcome::NoMediaFound);
        }
    };

    create_output_tree(&config.output_dir).await?;

    let entries = executor::execute_downloads(
        items,
        Arc::clone(&fetcher),
        Arc::clone(&limiter),
        &config.output_dir,
        config.download_delay,
        concurrency,
    )
    .await;

    let mut manifest = Manifest::new(&base, &config.output_dir);
    let mut saved_by_category: BTreeMap<MediaCategory, usize> = BTreeMap::new();
    for entry in entries {
        if entry.status == EntryStatus::Ok
            && let Some(category) = entry.category
        {
            *saved_by_category.entry(category).or_insert(0) += 1;
        }
        manifest.push(entry);
    }

    let manifest_path = config.output_dir.join(MANIFEST_FILENAME);
    manifest
        .save(&manifest_path)
        .await
        .map_err(|source| PipelineError::ManifestWrite {
            path: manifest_path.clone(),
            source,
        })?;

    info!(
        saved = manifest.saved,
        errors = manifest.errors,
        manifest = %manifest_path.display(),
        "run complete"
    );

    Ok(RunOutcome::Completed(RunSummary {
        output_dir: config.output_dir.clone(),
        manifest_path,
        saved: manifest.saved,
        errors: manifest.errors,
        saved_by_category,
    }))
}

/// Validates and parses the root URL. Anything but absolute http/https is an
/// input error, fatal before any network traffic.
fn parse_base_url(input: &str) -> Result<Url, PipelineError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidBaseUrl {
            url: input.to_string(),
            reason: "no URL provided".to_string(),
        });
    }
    let parsed = Url::parse(trimmed).map_err(|e| PipelineError::InvalidBaseUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PipelineError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(parsed)
}

/// Creates the output directory and its three category subdirectories.
async fn create_output_tree(output_dir: &Path) -> Result<(), PipelineError> {
    for category in MediaCategory::all() {
        let dir = output_dir.join(category.dir_name());
        if let Err(source) = tokio::fs::create_dir_all(&dir).await {
            return Err(PipelineError::OutputDir { path: dir, source });
        }
    }
    Ok(())
}
