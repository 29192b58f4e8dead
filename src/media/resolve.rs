//! Reference resolution and extension filtering.
//!
//! Raw references become absolute candidates by joining against the page
//! URL; candidates become [`MediaItem`]s when their path extension falls in
//! the allow-list. The final set is deduplicated by URL string and returned
//! in lexicographic URL order so manifests are reproducible across runs on
//! unchanged input.

use std::collections::HashSet;

use tracing::debug;
use url::Url;

use super::category::MediaCategory;
use super::item::MediaItem;

/// Resolves raw references against the page URL.
///
/// Already-absolute references pass through unchanged; relative ones are
/// joined per standard resolution rules. Candidates that fail to parse or
/// end up without an http/https scheme are dropped. Output is deduplicated
/// by resolved URL string.
#[must_use]
pub fn resolve_references<'a, I>(references: I, base: &Url) -> Vec<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut resolved = Vec::new();

    for reference in references {
        let reference = reference.trim();
        if reference.is_empty() {
            continue;
        }
        let Ok(candidate) = base.join(reference) else {
            debug!(reference, "unresolvable reference dropped");
            continue;
        };
        if !matches!(candidate.scheme(), "http" | "https") {
            debug!(reference, scheme = candidate.scheme(), "non-http candidate dropped");
            continue;
        }
        if seen.insert(candidate.as_str().to_string()) {
            resolved.push(candidate);
        }
    }

    resolved
}

/// Extracts the extension from a URL's final path segment.
///
/// A trailing dot-suffix counts as an extension only when the segment
/// actually contains a dot; a bare segment (or a trailing dot with nothing
/// after it) yields `None`. Query and fragment never participate.
#[must_use]
pub fn extension_of(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let dot = segment.rfind('.')?;
    let ext = &segment[dot + 1..];
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Filters candidates to those whose extension maps to a category.
///
/// Candidates with no extension, or with an extension outside the
/// allow-list, are dropped here (not retried). The result is sorted by URL
/// string - the deterministic processing order for everything downstream.
#[must_use]
pub fn filter_by_extension(candidates: Vec<Url>) -> Vec<MediaItem> {
    let mut items: Vec<MediaItem> = candidates
        .into_iter()
        .filter_map(|url| {
            let ext = extension_of(&url)?;
            let category = MediaCategory::from_extension(&ext)?;
            Some(MediaItem::new(url, category, &ext))
        })
        .collect();

    items.sort_by(|a, b| a.url.as_str().cmp(b.url.as_str()));
    items
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/articles/page.html").unwrap()
    }

    // ==================== resolve_references Tests ====================

    #[test]
    fn test_resolve_relative_reference_against_page() {
        let resolved = resolve_references(["photo.jpg"], &base());
        assert_eq!(resolved.len(), 1);
        assert_eq!(
            resolved[0].as_str(),
            "https://example.com/articles/photo.jpg"
        );
    }

    #[test]
    fn test_resolve_root_relative_reference() {
        let resolved = resolve_references(["/static/photo.jpg"], &base());
        assert_eq!(resolved[0].as_str(), "https://example.com/static/photo.jpg");
    }

    #[test]
    fn test_resolve_absolute_reference_unchanged() {
        let resolved = resolve_references(["https://cdn.example.org/a.png"], &base());
        assert_eq!(resolved[0].as_str(), "https://cdn.example.org/a.png");
    }

    #[test]
    fn test_resolve_protocol_relative_reference() {
        let resolved = resolve_references(["//cdn.example.org/a.png"], &base());
        assert_eq!(resolved[0].as_str(), "https://cdn.example.org/a.png");
    }

    #[test]
    fn test_resolve_drops_non_http_schemes() {
        let resolved = resolve_references(["ftp://example.com/a.png", "mailto:x@y.z"], &base());
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_resolve_deduplicates_by_resolved_url() {
        let resolved = resolve_references(
            ["photo.jpg", "./photo.jpg", "https://example.com/articles/photo.jpg"],
            &base(),
        );
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_resolve_ignores_empty_references() {
        let resolved = resolve_references(["", "   "], &base());
        assert!(resolved.is_empty());
    }

    // ==================== extension_of Tests ====================

    #[test]
    fn test_extension_of_simple_path() {
        let url = Url::parse("https://example.com/a/photo.jpg").unwrap();
        assert_eq!(extension_of(&url), Some("jpg".to_string()));
    }

    #[test]
    fn test_extension_of_ignores_query_and_fragment() {
        let url = Url::parse("https://example.com/photo.png?w=800#top").unwrap();
        assert_eq!(extension_of(&url), Some("png".to_string()));
    }

    #[test]
    fn test_extension_of_lowercases() {
        let url = Url::parse("https://example.com/PHOTO.JPG").unwrap();
        assert_eq!(extension_of(&url), Some("jpg".to_string()));
    }

    #[test]
    fn test_extension_of_bare_segment_is_none() {
        let url = Url::parse("https://example.com/download").unwrap();
        assert_eq!(extension_of(&url), None);
    }

    #[test]
    fn test_extension_of_trailing_dot_is_none() {
        let url = Url::parse("https://example.com/file.").unwrap();
        assert_eq!(extension_of(&url), None);
    }

    #[test]
    fn test_extension_of_dot_in_directory_does_not_count() {
        let url = Url::parse("https://example.com/v1.2/download").unwrap();
        assert_eq!(extension_of(&url), None);
    }

    // ==================== filter_by_extension Tests ====================

    #[test]
    fn test_filter_keeps_known_extensions_with_categories() {
        let candidates = vec![
            Url::parse("https://example.com/a.jpg").unwrap(),
            Url::parse("https://example.com/b.mp4").unwrap(),
            Url::parse("https://example.com/c.mp3").unwrap(),
        ];
        let items = filter_by_extension(candidates);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].category, MediaCategory::Images);
        assert_eq!(items[1].category, MediaCategory::Videos);
        assert_eq!(items[2].category, MediaCategory::Audio);
    }

    #[test]
    fn test_filter_drops_unknown_and_missing_extensions() {
        let candidates = vec![
            Url::parse("https://example.com/style.css").unwrap(),
            Url::parse("https://example.com/paper.pdf").unwrap(),
            Url::parse("https://example.com/download").unwrap(),
        ];
        assert!(filter_by_extension(candidates).is_empty());
    }

    #[test]
    fn test_filter_output_is_sorted_by_url() {
        let candidates = vec![
            Url::parse("https://example.com/z.jpg").unwrap(),
            Url::parse("https://example.com/a.jpg").unwrap(),
            Url::parse("https://example.com/m.jpg").unwrap(),
        ];
        let items = filter_by_extension(candidates);
        let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        let mut sorted = urls.clone();
        sorted.sort_unstable();
        assert_eq!(urls, sorted);
    }
}
