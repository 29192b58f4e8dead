//! Download execution: fetch each selected item, place its bytes, record an
//! outcome.
//!
//! Items run through a semaphore-bounded worker pool. A failure on one item
//! is recorded in its manifest entry and never aborts siblings. Entries are
//! collected from the workers and sorted by URL before being handed back, so
//! the manifest is deterministic however the pool interleaved.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use super::manifest::ManifestEntry;
use crate::fetch::{FetchKind, PageFetcher, RateLimiter};
use crate::media::{MediaCategory, MediaItem, extension_for_content_type};

/// Hex chars of the URL hash appended to colliding filenames.
const COLLISION_HASH_LEN: usize = 8;

/// Downloads every item and returns one manifest entry per item, sorted by
/// URL. `download_delay` is the per-origin spacing; `concurrency` bounds the
/// worker pool.
pub async fn execute_downloads(
    mut items: Vec<MediaItem>,
    fetcher: Arc<PageFetcher>,
    limiter: Arc<RateLimiter>,
    output_dir: &Path,
    download_delay: Duration,
    concurrency: usize,
) -> Vec<ManifestEntry> {
    items.sort_by(|a, b| a.url.as_str().cmp(b.url.as_str()));

    info!(items = items.len(), "starting downloads");
    let progress = ProgressBar::new(items.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let claimed: Arc<DashSet<PathBuf>> = Arc::new(DashSet::new());
    let mut handles = Vec::with_capacity(items.len());

    for item in items {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            // Semaphore closed - nothing closes it, but record rather than
            // lose the item if it ever happens.
            warn!(url = %item.url, "worker pool unavailable");
            break;
        };

        let fetcher = Arc::clone(&fetcher);
        let limiter = Arc::clone(&limiter);
        let claimed = Arc::clone(&claimed);
        let output_dir = output_dir.to_path_buf();
        let progress = progress.clone();

        handles.push((
            item.url.as_str().to_string(),
            tokio::spawn(async move {
                let _permit = permit;
                let entry = download_item(
                    &item,
                    &fetcher,
                    &limiter,
                    &claimed,
                    &output_dir,
                    download_delay,
                )
                .await;
                progress.inc(1);
                entry
            }),
        ));
    }

    let mut entries = Vec::with_capacity(handles.len());
    for (url, handle) in handles {
        match handle.await {
            Ok(entry) => entries.push(entry),
            Err(join_error) => {
                // A panicking task still gets an entry; the sum law holds.
                warn!(url = %url, error = %join_error, "download task failed");
                if let Ok(parsed) = Url::parse(&url) {
                    entries.push(ManifestEntry::error(
                        &parsed,
                        None,
                        0,
                        None,
                        format!("download task failed: {join_error}"),
                    ));
                }
            }
        }
    }
    progress.finish_and_clear();

    entries.sort_by(|a, b| a.url.cmp(&b.url));
    entries
}

/// Fetches one item and writes it under its category directory.
async fn download_item(
    item: &MediaItem,
    fetcher: &PageFetcher,
    limiter: &RateLimiter,
    claimed: &DashSet<PathBuf>,
    output_dir: &Path,
    download_delay: Duration,
) -> ManifestEntry {
    limiter.acquire(item.url.as_str(), download_delay).await;

    let body = match fetcher.fetch(item.url.as_str(), FetchKind::Asset).await {
        Ok(body) => body,
        Err(error) => {
            debug!(url = %item.url, error = %error, "fetch failed");
            return ManifestEntry::error(&item.url, None, 0, None, error.to_string());
        }
    };
    let size = body.bytes.len() as u64;

    let (filename, extension) = destination_filename(&item.url, body.content_type.as_deref());
    let Some(category) = MediaCategory::from_extension(&extension) else {
        return ManifestEntry::error(
            &item.url,
            body.content_type,
            size,
            None,
            format!("unsupported file type: {extension}"),
        );
    };

    let dir = output_dir.join(category.dir_name());
    let target = claim_destination(claimed, &dir, &sanitize_filename(&filename), &item.url);

    if let Err(io_error) = tokio::fs::write(&target, &body.bytes).await {
        warn!(url = %item.url, path = %target.display(), error = %io_error, "write failed");
        return ManifestEntry::error(
            &item.url,
            body.content_type,
            size,
            Some(category),
            format!("failed to write {}: {io_error}", target.display()),
        );
    }

    let saved_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!(url = %item.url, path = %target.display(), size, "saved");
    ManifestEntry::ok(
        &item.url,
        body.content_type,
        size,
        format!("{}/{saved_name}", category.dir_name()),
        category,
    )
}

/// Derives the destination filename and its effective extension.
///
/// The URL's final path segment (percent-decoded) names the file. A segment
/// with no dot falls back to a Content-Type-derived extension; with neither,
/// the file is named `<segment>.unknown` and the caller records it as
/// unsupported.
fn destination_filename(url: &Url, content_type: Option<&str>) -> (String, String) {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("file");
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());

    if let Some(dot) = decoded.rfind('.')
        && dot + 1 < decoded.len()
    {
        let extension = decoded[dot + 1..].to_ascii_lowercase();
        return (decoded, extension);
    }

    match content_type.and_then(extension_for_content_type) {
        Some(extension) => (format!("{decoded}.{extension}"), extension.to_string()),
        None => (format!("{decoded}.unknown"), "unknown".to_string()),
    }
}

/// Restricts a filename to `[A-Za-z0-9._-]`. Idempotent: sanitizing an
/// already-sanitized name changes nothing.
fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c,
            '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    // Dot-only names would escape the category directory or vanish.
    if sanitized.chars().all(|c| c == '.') {
        return "file".to_string();
    }
    sanitized
}

/// Picks the destination path, disambiguating on collision.
///
/// A path is taken when a file already exists there or another worker
/// claimed it this run. The colliding item gets a short deterministic hash
/// of its source URL injected before the extension, so two distinct URLs
/// with the same sanitized name both land on disk.
fn claim_destination(
    claimed: &DashSet<PathBuf>,
    dir: &Path,
    filename: &str,
    source_url: &Url,
) -> PathBuf {
    let base = dir.join(filename);
    if claimed.insert(base.clone()) && !base.exists() {
        return base;
    }

    let suffixed = dir.join(inject_url_hash(filename, source_url));
    claimed.insert(suffixed.clone());
    suffixed
}

/// `photo.jpg` + url -> `photo_3a5b9c01.jpg`
fn inject_url_hash(filename: &str, url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let hash = &hex::encode(digest)[..COLLISION_HASH_LEN];
    match filename.rfind('.') {
        Some(dot) => format!("{}_{hash}{}", &filename[..dot], &filename[dot..]),
        None => format!("{filename}_{hash}"),
    }
}
