//! Media categories and the extension allow-list.
//!
//! The pipeline partitions known file extensions three ways; anything
//! outside the partition is not media it handles and is dropped at filter
//! time (or recorded as unsupported if it reaches the download stage via the
//! content-type fallback).

use serde::{Deserialize, Serialize};

/// Image file extensions (without dots).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "avif", "tiff", "tif", "bmp", "ico",
];

/// Video file extensions.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "webm", "ogv", "mov", "avi", "wmv", "flv", "mkv", "mpg", "mpeg", "m4v",
];

/// Audio file extensions.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "aac", "flac", "m4a", "wma", "opus"];

/// The three-way media classification. Serializes to the same lowercase
/// names used for the output subdirectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Images,
    Videos,
    Audio,
}

impl MediaCategory {
    /// Maps a (lowercase or mixed-case) extension to its category.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        let ext = extension.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Images)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Videos)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else {
            None
        }
    }

    /// Output subdirectory name for this category.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Videos => "videos",
            Self::Audio => "audio",
        }
    }

    /// All categories, in output order.
    #[must_use]
    pub fn all() -> [Self; 3] {
        [Self::Images, Self::Videos, Self::Audio]
    }
}

/// Every known media extension, images first.
pub fn known_extensions() -> impl Iterator<Item = &'static str> {
    IMAGE_EXTENSIONS
        .iter()
        .chain(VIDEO_EXTENSIONS)
        .chain(AUDIO_EXTENSIONS)
        .copied()
}

/// Maps a Content-Type header value to a file extension (without dot).
///
/// Parameters (`; charset=...`) are stripped. Only media types are mapped;
/// everything else yields `None` so the caller can record the item as
/// unsupported.
#[must_use]
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    let ext = match mime.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        "image/tiff" => "tif",
        "image/bmp" => "bmp",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/ogg" => "ogv",
        "video/quicktime" => "mov",
        "video/mpeg" => "mpg",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/aac" => "aac",
        "audio/flac" => "flac",
        _ => return None,
    };
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_partition_is_disjoint() {
        for ext in IMAGE_EXTENSIONS {
            assert!(!VIDEO_EXTENSIONS.contains(ext));
            assert!(!AUDIO_EXTENSIONS.contains(ext));
        }
        for ext in VIDEO_EXTENSIONS {
            assert!(!AUDIO_EXTENSIONS.contains(ext));
        }
    }

    #[test]
    fn test_from_extension_maps_each_table() {
        assert_eq!(MediaCategory::from_extension("jpg"), Some(MediaCategory::Images));
        assert_eq!(MediaCategory::from_extension("webm"), Some(MediaCategory::Videos));
        assert_eq!(MediaCategory::from_extension("flac"), Some(MediaCategory::Audio));
    }

    #[test]
    fn test_from_extension_is_case_insensitive() {
        assert_eq!(MediaCategory::from_extension("JPG"), Some(MediaCategory::Images));
        assert_eq!(MediaCategory::from_extension("Mp4"), Some(MediaCategory::Videos));
    }

    #[test]
    fn test_from_extension_unknown_is_none() {
        assert_eq!(MediaCategory::from_extension("xyz"), None);
        assert_eq!(MediaCategory::from_extension("pdf"), None);
        assert_eq!(MediaCategory::from_extension(""), None);
    }

    #[test]
    fn test_dir_names_match_serialization() {
        for category in MediaCategory::all() {
            let serialized = serde_json::to_string(&category).unwrap_or_default();
            assert_eq!(serialized, format!("\"{}\"", category.dir_name()));
        }
    }

    #[test]
    fn test_known_extensions_covers_all_tables() {
        let count = known_extensions().count();
        assert_eq!(
            count,
            IMAGE_EXTENSIONS.len() + VIDEO_EXTENSIONS.len() + AUDIO_EXTENSIONS.len()
        );
        assert!(known_extensions().any(|ext| ext == "ogv"));
        assert!(known_extensions().all(|ext| ext != "css"));
    }

    #[test]
    fn test_extension_for_content_type_strips_parameters() {
        assert_eq!(
            extension_for_content_type("image/png; charset=binary"),
            Some("png")
        );
        assert_eq!(extension_for_content_type("Image/JPEG"), Some("jpg"));
    }

    #[test]
    fn test_extension_for_content_type_non_media_is_none() {
        assert_eq!(extension_for_content_type("text/html"), None);
        assert_eq!(extension_for_content_type("application/pdf"), None);
        assert_eq!(extension_for_content_type(""), None);
    }
}
