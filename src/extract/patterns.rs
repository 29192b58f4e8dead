//! Fallback pattern pass: permissive sweeps over raw page text.
//!
//! Structural parsing misses references buried in templated markup, JSON
//! islands, and data attributes. These patterns catch them at the cost of
//! false positives, which the resolver/filter and downloader tolerate.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::push_reference;
use crate::media::known_extensions;

fn extension_alternation() -> String {
    known_extensions().collect::<Vec<_>>().join("|")
}

/// Absolute URL ending in a known media extension.
#[allow(clippy::expect_used)]
static ABSOLUTE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?i)https?://[^"'\s<>]*\.(?:{})(?:\?[^"'\s<>]*)?"#,
        extension_alternation()
    ))
    .expect("absolute-url pattern is valid")
});

/// Root-relative path ending in a known media extension.
#[allow(clippy::expect_used)]
static ROOT_RELATIVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?i)/[^"'\s<>]*\.(?:{})(?:\?[^"'\s<>]*)?"#,
        extension_alternation()
    ))
    .expect("root-relative pattern is valid")
});

/// Any quoted string ending in a known media extension.
#[allow(clippy::expect_used)]
static QUOTED_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?i)["']([^"']*\.(?:{})(?:\?[^"']*)?)["']"#,
        extension_alternation()
    ))
    .expect("quoted-string pattern is valid")
});

/// A `data-*` attribute whose value ends in a known media extension.
#[allow(clippy::expect_used)]
static DATA_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?i)data-[^=\s]*=["']([^"']*\.(?:{})(?:\?[^"']*)?)["']"#,
        extension_alternation()
    ))
    .expect("data-attribute pattern is valid")
});

/// Sweeps raw page text with the fallback patterns.
///
/// Necessarily over-inclusive: anything that merely looks like a media
/// location is emitted. Downstream resolution and per-item error recording
/// absorb the false positives.
#[must_use]
pub fn pattern_references(text: &str) -> HashSet<String> {
    let mut references = HashSet::new();

    for found in ABSOLUTE_URL.find_iter(text) {
        push_reference(&mut references, found.as_str());
    }
    for found in ROOT_RELATIVE_PATH.find_iter(text) {
        push_reference(&mut references, found.as_str());
    }
    for capture in QUOTED_STRING.captures_iter(text) {
        if let Some(value) = capture.get(1) {
            push_reference(&mut references, value.as_str());
        }
    }
    for capture in DATA_ATTRIBUTE.captures_iter(text) {
        if let Some(value) = capture.get(1) {
            push_reference(&mut references, value.as_str());
        }
    }

    references
}

/// Quoted strings ending in a known media extension, for script-text
/// scanning in the auxiliary pass.
pub(crate) fn quoted_media_strings(text: &str) -> Vec<String> {
    QUOTED_STRING
        .captures_iter(text)
        .filter_map(|capture| capture.get(1))
        .map(|value| value.as_str().to_string())
        .collect()
}
