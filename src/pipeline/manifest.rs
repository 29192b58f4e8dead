//! The durable record of a run: one entry per attempted item.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::media::MediaCategory;

/// Outcome of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Ok,
    Error,
}

/// One item's outcome. Created once, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The absolute URL that was attempted.
    pub url: String,

    /// Whether the item was saved.
    pub status: EntryStatus,

    /// Declared Content-Type of the response, when one was received.
    pub content_type: Option<String>,

    /// Bytes received (0 when nothing was).
    pub size: u64,

    /// Saved path relative to the output directory, for ok entries.
    pub path: Option<String>,

    /// Category the item was saved under, for ok entries.
    pub category: Option<MediaCategory>,

    /// Human-readable error text, for error entries.
    pub error: Option<String>,
}

impl ManifestEntry {
    /// Entry for a saved item.
    #[must_use]
    pub fn ok(
        url: &Url,
        content_type: Option<String>,
        size: u64,
        path: String,
        category: MediaCategory,
    ) -> Self {
        Self {
            url: url.as_str().to_string(),
            status: EntryStatus::Ok,
            content_type,
            size,
            path: Some(path),
            category: Some(category),
            error: None,
        }
    }

    /// Entry for a failed item. `category` stays set when the failure
    /// happened after categorization (e.g. a write error); it is `None` for
    /// fetch failures and unsupported types.
    #[must_use]
    pub fn error(
        url: &Url,
        content_type: Option<String>,
        size: u64,
        category: Option<MediaCategory>,
        error: String,
    ) -> Self {
        Self {
            url: url.as_str().to_string(),
            status: EntryStatus::Error,
            content_type,
            size,
            path: None,
            category,
            error: Some(error),
        }
    }
}

/// Aggregate record of one run, serialized once as `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// The page the run was pointed at.
    pub base_url: String,

    /// Absolute-ish output directory as given to the run.
    pub output_dir: String,

    /// Count of ok entries.
    pub saved: usize,

    /// Count of error entries.
    pub errors: usize,

    /// Ordered entries, one per attempted item.
    pub items: Vec<ManifestEntry>,
}

impl Manifest {
    /// Creates an empty manifest for a run.
    #[must_use]
    pub fn new(base_url: &Url, output_dir: &Path) -> Self {
        Self {
            base_url: base_url.as_str().to_string(),
            output_dir: output_dir.display().to_string(),
            saved: 0,
            errors: 0,
            items: Vec::new(),
        }
    }

    /// Appends an entry, keeping the tallies in step.
    pub fn push(&mut self, entry: ManifestEntry) {
        match entry.status {
            EntryStatus::Ok => self.saved += 1,
            EntryStatus::Error => self.errors += 1,
        }
        self.items.push(entry);
    }

    /// Serializes the manifest to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an IO error when serialization or the write fails.
    pub async fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(path, json).await
    }
}
