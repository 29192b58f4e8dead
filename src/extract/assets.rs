//! Auxiliary extraction pass: linked stylesheet and script scanning.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;
use url::Url;

use super::CSS_URL_PATTERN;
use super::patterns::quoted_media_strings;
use super::push_reference;
use super::structural::LinkedAssets;
use crate::fetch::{FetchKind, PageFetcher, RateLimiter};

/// Fetches each linked stylesheet and script and scans its text.
///
/// Stylesheet `url(...)` references are resolved against the stylesheet's
/// own URL (where CSS relatives point) and emitted as absolute reference
/// strings; script references are emitted raw, like any other page-level
/// reference. A resource that fails to fetch is skipped - this pass never
/// fails the run.
pub async fn auxiliary_references(
    fetcher: &PageFetcher,
    limiter: &RateLimiter,
    assets: &LinkedAssets,
    pacing: Duration,
) -> HashSet<String> {
    let mut references = HashSet::new();

    for sheet_url in &assets.stylesheets {
        let Some(text) = fetch_text(fetcher, limiter, sheet_url, pacing).await else {
            continue;
        };
        for capture in CSS_URL_PATTERN.captures_iter(&text) {
            let Some(raw) = capture.get(1) else { continue };
            let raw = raw.as_str().trim();
            if raw.is_empty() || super::is_excluded_reference(raw) {
                continue;
            }
            // CSS relatives are sheet-relative; emit the resolved absolute
            // form so page-base resolution downstream cannot misplace them.
            match sheet_url.join(raw) {
                Ok(resolved) => push_reference(&mut references, resolved.as_str()),
                Err(_) => push_reference(&mut references, raw),
            }
        }
    }

    for script_url in &assets.scripts {
        let Some(text) = fetch_text(fetcher, limiter, script_url, pacing).await else {
            continue;
        };
        for quoted in quoted_media_strings(&text) {
            push_reference(&mut references, &quoted);
        }
    }

    references
}

async fn fetch_text(
    fetcher: &PageFetcher,
    limiter: &RateLimiter,
    url: &Url,
    pacing: Duration,
) -> Option<String> {
    limiter.acquire(url.as_str(), pacing).await;
    match fetcher.fetch(url.as_str(), FetchKind::Asset).await {
        Ok(body) => Some(String::from_utf8_lossy(&body.bytes).into_owned()),
        Err(error) => {
            debug!(url = %url, error = %error, "auxiliary resource skipped");
            None
        }
    }
}
