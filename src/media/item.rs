//! The unit of download work.

use url::Url;

use super::category::MediaCategory;

/// A candidate accepted for download: an absolute URL with its inferred
/// category and extension. Created by the resolver/filter, consumed exactly
/// once by the download executor, never mutated in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Absolute http/https URL of the asset.
    pub url: Url,

    /// Category inferred from the URL's path extension.
    pub category: MediaCategory,

    /// The inferred extension (lowercase, without dot).
    pub extension: String,
}

impl MediaItem {
    /// Creates an item. The extension is stored lowercase.
    #[must_use]
    pub fn new(url: Url, category: MediaCategory, extension: &str) -> Self {
        Self {
            url,
            category,
            extension: extension.to_ascii_lowercase(),
        }
    }
}
