//! Structural extraction pass: parsed-markup scanning.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use super::CSS_URL_PATTERN;
use super::push_reference;

/// Attributes on `<img>` that carry a single asset location, including the
/// common lazy-loading variants.
const IMG_SRC_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "data-original"];

#[allow(clippy::expect_used)]
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static SOURCE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("source").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static VIDEO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("video").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static AUDIO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("audio").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static STYLED_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[style]").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static STYLE_BLOCK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("style").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[href]").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static SCRIPT_SRC_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script[src]").expect("static selector is valid"));

/// Scans parsed markup for media references.
///
/// Covers media element source attributes, every URL of a comma-separated
/// `srcset` candidate list, lazy-loading attributes, `poster` on playable
/// media, and `url(...)` inside inline `style` attributes and `<style>`
/// blocks. Never fails; unparseable markup just yields fewer references.
#[must_use]
pub fn structural_references(html: &str) -> HashSet<String> {
    let document = Html::parse_document(html);
    let mut references = HashSet::new();

    for img in document.select(&IMG_SELECTOR) {
        for attr in IMG_SRC_ATTRS {
            if let Some(value) = img.value().attr(attr) {
                push_reference(&mut references, value);
            }
        }
        if let Some(srcset) = img.value().attr("srcset") {
            push_srcset_candidates(&mut references, srcset);
        }
    }

    for source in document.select(&SOURCE_SELECTOR) {
        if let Some(src) = source.value().attr("src") {
            push_reference(&mut references, src);
        }
        if let Some(srcset) = source.value().attr("srcset") {
            push_srcset_candidates(&mut references, srcset);
        }
    }

    for video in document.select(&VIDEO_SELECTOR) {
        for attr in ["src", "poster"] {
            if let Some(value) = video.value().attr(attr) {
                push_reference(&mut references, value);
            }
        }
    }

    for audio in document.select(&AUDIO_SELECTOR) {
        if let Some(src) = audio.value().attr("src") {
            push_reference(&mut references, src);
        }
    }

    for styled in document.select(&STYLED_SELECTOR) {
        if let Some(style) = styled.value().attr("style") {
            push_css_urls(&mut references, style);
        }
    }

    for block in document.select(&STYLE_BLOCK_SELECTOR) {
        let css: String = block.text().collect();
        push_css_urls(&mut references, &css);
    }

    references
}

/// The URL of each comma-separated srcset candidate (the token before the
/// width/density descriptor).
fn push_srcset_candidates(references: &mut HashSet<String>, srcset: &str) {
    for candidate in srcset.split(',') {
        if let Some(location) = candidate.trim().split_whitespace().next() {
            push_reference(references, location);
        }
    }
}

/// Every `url(...)` occurrence in a run of CSS text.
fn push_css_urls(references: &mut HashSet<String>, css: &str) {
    for capture in CSS_URL_PATTERN.captures_iter(css) {
        if let Some(location) = capture.get(1) {
            push_reference(references, location.as_str());
        }
    }
}

/// Linked auxiliary resources discovered in markup, resolved against the
/// page URL and ready to fetch.
#[derive(Debug, Default, Clone)]
pub struct LinkedAssets {
    /// Stylesheet URLs, in document order, deduplicated.
    pub stylesheets: Vec<Url>,
    /// External script URLs, in document order, deduplicated.
    pub scripts: Vec<Url>,
}

/// Collects linked stylesheet and script URLs for the auxiliary pass.
///
/// Only http/https resolutions are kept; a missing or malformed `href`/`src`
/// is skipped, never an error.
#[must_use]
pub fn linked_assets(html: &str, base: &Url) -> LinkedAssets {
    let document = Html::parse_document(html);
    let mut assets = LinkedAssets::default();
    let mut seen: HashSet<String> = HashSet::new();

    for link in document.select(&LINK_SELECTOR) {
        let rel = link.value().attr("rel").unwrap_or("");
        if !rel
            .split_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        {
            continue;
        }
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if let Some(resolved) = resolve_http(base, href)
            && seen.insert(resolved.as_str().to_string())
        {
            assets.stylesheets.push(resolved);
        }
    }

    for script in document.select(&SCRIPT_SRC_SELECTOR) {
        let Some(src) = script.value().attr("src") else {
            continue;
        };
        if let Some(resolved) = resolve_http(base, src)
            && seen.insert(resolved.as_str().to_string())
        {
            assets.scripts.push(resolved);
        }
    }

    assets
}

fn resolve_http(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() || super::is_excluded_reference(reference) {
        return None;
    }
    let resolved = base.join(reference).ok()?;
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}
