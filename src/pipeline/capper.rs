//! Volume capping for oversized candidate sets.
//!
//! Pages with thousands of references would otherwise turn one run into a
//! crawl. Above the threshold the working set narrows to images (the most
//! numerous and most interchangeable class on a "too many files" page),
//! every survivor is size-probed, and only the largest `threshold` items go
//! on to download. Probing plus downloading means two round-trips per
//! survivor; origin content is assumed stable within a run.

use std::cmp::Reverse;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, info, warn};

use crate::fetch::{PageFetcher, RateLimiter};
use crate::media::{MediaCategory, MediaItem};

/// Result of applying the volume cap.
#[derive(Debug)]
pub enum CapDecision {
    /// Set was within bounds; untouched.
    Kept(Vec<MediaItem>),

    /// Set was narrowed to the largest images.
    Capped(Vec<MediaItem>),

    /// Set was oversized but held no images; there is nothing sensible to
    /// keep, so the run has nothing to do.
    NothingToDo,
}

/// Applies the volume cap to a filtered candidate set.
///
/// Probes run through a bounded worker pool with per-origin pacing; a probe
/// that fails simply excludes its candidate from ranking (no retry at this
/// stage). Ties in probed size break on URL order so the kept set is
/// deterministic.
pub async fn apply_volume_cap(
    items: Vec<MediaItem>,
    threshold: usize,
    fetcher: &PageFetcher,
    limiter: &RateLimiter,
    probe_delay: Duration,
    concurrency: usize,
) -> CapDecision {
    if items.len() <= threshold {
        return CapDecision::Kept(items);
    }

    info!(
        candidates = items.len(),
        threshold, "candidate set over threshold, narrowing to images"
    );

    let images: Vec<MediaItem> = items
        .into_iter()
        .filter(|item| item.category == MediaCategory::Images)
        .collect();
    if images.is_empty() {
        warn!("oversized candidate set contains no images");
        return CapDecision::NothingToDo;
    }

    let probed: Vec<(MediaItem, Option<u64>)> = stream::iter(images)
        .map(|item| async move {
            limiter.acquire(item.url.as_str(), probe_delay).await;
            let size = fetcher.probe_size(item.url.as_str()).await;
            (item, size)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let total = probed.len();
    let mut ranked: Vec<(MediaItem, u64)> = probed
        .into_iter()
        .filter_map(|(item, size)| size.map(|s| (item, s)))
        .collect();
    if ranked.len() < total {
        debug!(
            excluded = total - ranked.len(),
            "probes failed, candidates excluded from ranking"
        );
    }

    if ranked.is_empty() {
        warn!("every size probe failed");
        return CapDecision::NothingToDo;
    }

    ranked.sort_by(|a, b| {
        Reverse(a.1)
            .cmp(&Reverse(b.1))
            .then_with(|| a.0.url.as_str().cmp(b.0.url.as_str()))
    });
    ranked.truncate(threshold);

    info!(kept = ranked.len(), "volume cap applied");
    CapDecision::Capped(ranked.into_iter().map(|(item, _)| item).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fetch::RetryPolicy;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn image_item(url: &str) -> MediaItem {
        MediaItem::new(Url::parse(url).unwrap(), MediaCategory::Images, "jpg")
    }

    fn video_item(url: &str) -> MediaItem {
        MediaItem::new(Url::parse(url).unwrap(), MediaCategory::Videos, "mp4")
    }

    fn test_fetcher() -> PageFetcher {
        PageFetcher::new(
            RetryPolicy::with_budget(0),
            std::sync::Arc::new(RateLimiter::new()),
        )
    }

    #[tokio::test]
    async fn test_under_threshold_set_is_untouched() {
        let fetcher = test_fetcher();
        let limiter = RateLimiter::new();
        let items = vec![
            image_item("https://example.com/a.jpg"),
            video_item("https://example.com/b.mp4"),
        ];

        match apply_volume_cap(items.clone(), 10, &fetcher, &limiter, Duration::ZERO, 2).await {
            CapDecision::Kept(kept) => assert_eq!(kept, items),
            other => panic!("expected Kept, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_oversized_set_without_images_has_nothing_to_do() {
        let fetcher = test_fetcher();
        let limiter = RateLimiter::new();
        let items = vec![
            video_item("https://example.com/a.mp4"),
            video_item("https://example.com/b.mp4"),
            video_item("https://example.com/c.mp4"),
        ];

        match apply_volume_cap(items, 2, &fetcher, &limiter, Duration::ZERO, 2).await {
            CapDecision::NothingToDo => {}
            other => panic!("expected NothingToDo, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cap_keeps_largest_images_only() {
        let server = MockServer::start().await;
        for (name, size) in [("small", 10_usize), ("medium", 100), ("large", 1000)] {
            Mock::given(method("GET"))
                .and(path(format!("/{name}.jpg")))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; size]))
                .mount(&server)
                .await;
            // HEAD mocks mirror the GET bodies; wiremock serves the
            // Content-Length header either way.
            Mock::given(method("HEAD"))
                .and(path(format!("/{name}.jpg")))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; size]))
                .mount(&server)
                .await;
        }

        let fetcher = test_fetcher();
        let limiter = RateLimiter::new();
        let items = vec![
            image_item(&format!("{}/small.jpg", server.uri())),
            image_item(&format!("{}/medium.jpg", server.uri())),
            image_item(&format!("{}/large.jpg", server.uri())),
            video_item(&format!("{}/clip.mp4", server.uri())),
        ];

        match apply_volume_cap(items, 2, &fetcher, &limiter, Duration::ZERO, 2).await {
            CapDecision::Capped(kept) => {
                assert_eq!(kept.len(), 2);
                assert!(kept.iter().all(|i| i.category == MediaCategory::Images));
                assert!(kept[0].url.as_str().ends_with("/large.jpg"));
                assert!(kept[1].url.as_str().ends_with("/medium.jpg"));
            }
            other => panic!("expected Capped, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_probes_are_excluded_from_ranking() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; 64]))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/ok.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; 64]))
            .mount(&server)
            .await;
        // /missing.jpg has no mock: 404 on both HEAD and GET

        let fetcher = test_fetcher();
        let limiter = RateLimiter::new();
        let items = vec![
            image_item(&format!("{}/ok.jpg", server.uri())),
            image_item(&format!("{}/missing.jpg", server.uri())),
            image_item(&format!("{}/missing2.jpg", server.uri())),
        ];

        match apply_volume_cap(items, 2, &fetcher, &limiter, Duration::ZERO, 2).await {
            CapDecision::Capped(kept) => {
                assert_eq!(kept.len(), 1);
                assert!(kept[0].url.as_str().ends_with("/ok.jpg"));
            }
            other => panic!("expected Capped, got {other:?}"),
        }
    }
}
