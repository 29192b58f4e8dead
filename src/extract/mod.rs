//! Reference extraction from page content.
//!
//! Three independent passes feed one candidate-set union:
//!
//! - [`structural_references`] walks the parsed markup: media element source
//!   attributes, responsive-image candidate sets, lazy-loading attributes,
//!   posters, and `url(...)` occurrences in inline styles and `<style>`
//!   blocks.
//! - [`auxiliary_references`] fetches linked stylesheets and scripts and
//!   scans their text.
//! - [`pattern_references`] sweeps the raw page text with permissive
//!   patterns to catch references structural parsing misses (templated
//!   markup, data attributes). Over-inclusive by design; false positives
//!   are tolerated downstream.
//!
//! The passes stay independent so the precision/recall of each can be
//! verified on its own; their union is what reaches resolution. Extraction
//! never fails - missing or malformed inputs simply yield fewer references.
//!
//! Any reference beginning with an inline-content, script-execution, or
//! about scheme is discarded at the source and never reaches resolution.

mod assets;
mod patterns;
mod structural;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

pub use assets::auxiliary_references;
pub use patterns::pattern_references;
pub use structural::{LinkedAssets, linked_assets, structural_references};

/// `url(...)` occurrences in a run of CSS text, quoted or not. Shared by the
/// structural pass (inline styles, `<style>` blocks) and the auxiliary pass
/// (fetched stylesheets).
#[allow(clippy::expect_used)]
pub(crate) static CSS_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*["']?([^"')]+?)["']?\s*\)"#).expect("css url regex is valid")
});

/// Returns true for references that must never reach resolution:
/// `data:` (inline content), `javascript:` (script execution), `about:`.
#[must_use]
pub fn is_excluded_reference(reference: &str) -> bool {
    let lowered = reference.trim_start().to_ascii_lowercase();
    lowered.starts_with("data:")
        || lowered.starts_with("javascript:")
        || lowered.starts_with("about:")
}

/// Adds a raw reference to the set unless it is empty or excluded.
pub(crate) fn push_reference(references: &mut HashSet<String>, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_excluded_reference(trimmed) {
        return;
    }
    references.insert(trimmed.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_schemes_are_rejected() {
        assert!(is_excluded_reference("data:image/png;base64,AAAA"));
        assert!(is_excluded_reference("javascript:void(0)"));
        assert!(is_excluded_reference("about:blank"));
    }

    #[test]
    fn test_exclusion_is_case_insensitive() {
        assert!(is_excluded_reference("DATA:image/png;base64,AAAA"));
        assert!(is_excluded_reference("JavaScript:alert(1)"));
    }

    #[test]
    fn test_ordinary_references_pass() {
        assert!(!is_excluded_reference("photo.jpg"));
        assert!(!is_excluded_reference("/static/a.png"));
        assert!(!is_excluded_reference("https://example.com/a.png"));
        // "database.jpg" starts with "data" but not the scheme
        assert!(!is_excluded_reference("database.jpg"));
    }

    #[test]
    fn test_push_reference_trims_and_filters() {
        let mut refs = HashSet::new();
        push_reference(&mut refs, "  photo.jpg  ");
        push_reference(&mut refs, "");
        push_reference(&mut refs, "   ");
        push_reference(&mut refs, "data:image/gif;base64,R0lGOD");
        assert_eq!(refs.len(), 1);
        assert!(refs.contains("photo.jpg"));
    }
}
