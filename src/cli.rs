//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use mediagrab_core::{DEFAULT_CAP_THRESHOLD, DEFAULT_CONCURRENCY, DEFAULT_RETRY_BUDGET};

/// Download all media assets referenced by a web page.
///
/// Mediagrab fetches a page, discovers the images, video, and audio it
/// references, and saves them into per-category folders with a JSON manifest
/// of outcomes.
#[derive(Parser, Debug)]
#[command(name = "mediagrab")]
#[command(author, version, about)]
pub struct Args {
    /// Web page URL to scan (http/https)
    pub url: String,

    /// Output directory (category folders and manifest.json are created inside)
    #[arg(short = 'o', long, default_value = "media")]
    pub output: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum concurrent downloads (1-8; 1 is strictly sequential)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=8))]
    pub concurrency: u8,

    /// Extra attempts for blocked (403/429) and transport failures (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_RETRY_BUDGET as u8, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: u8,

    /// Minimum delay between downloads from the same origin in milliseconds
    /// (0 to disable, max 60000)
    #[arg(short = 'l', long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: u64,

    /// Candidate-set size above which only the largest images are kept
    #[arg(long, default_value_t = DEFAULT_CAP_THRESHOLD as u32, value_parser = clap::value_parser!(u32).range(1..))]
    pub cap: u32,

    /// Skip fetching linked stylesheets and scripts for extra references
    #[arg(long)]
    pub no_assets: bool,
}
