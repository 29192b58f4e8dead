//! CLI entry point for the mediagrab tool.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use mediagrab_core::{RunConfig, RunOutcome, run};
use tracing::debug;

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let mut config = RunConfig::new(args.url, args.output);
    config.cap_threshold = args.cap as usize;
    config.retry_budget = u32::from(args.max_retries);
    config.concurrency = usize::from(args.concurrency);
    config.download_delay = Duration::from_millis(args.rate_limit);
    config.fetch_assets = !args.no_assets;

    match run(&config).await? {
        RunOutcome::NoMediaFound => {
            println!("No media files found on the page.");
        }
        RunOutcome::Completed(summary) => {
            // Parseable summary lines; front-ends read these instead of
            // re-deriving pipeline internals.
            println!("Output directory: {}", summary.output_dir.display());
            println!("Manifest: {}", summary.manifest_path.display());
            println!(
                "Saved {} media files, {} errors",
                summary.saved, summary.errors
            );
            if !summary.saved_by_category.is_empty() {
                println!("Files by category:");
                for (category, count) in &summary.saved_by_category {
                    println!("  {}: {}", category.dir_name(), count);
                }
            }
        }
    }

    Ok(())
}
