//! Remote release catalog models.
//!
//! These deserialize directly from the GitHub releases API and are
//! re-fetched on every catalog view, never cached across sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A downloadable artifact attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Remote asset id; keys the per-download in-flight tracking.
    pub id: u64,
    /// File name. This is the ledger key: release lines reuse one canonical
    /// file name across versions, so the release id would over-count.
    #[serde(rename = "name")]
    pub file_name: String,
    /// Direct download URL.
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
    /// Size in bytes as reported by the catalog.
    #[serde(rename = "size", default)]
    pub size_bytes: u64,
}

/// One release in the remote catalog, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseEntry {
    /// Remote release id.
    pub id: u64,
    /// Human-readable release name; the catalog may omit it.
    #[serde(rename = "name", default)]
    pub display_name: Option<String>,
    /// Release tag.
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Publication timestamp.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Attached artifacts, in catalog order.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl ReleaseEntry {
    /// Display title, falling back to the tag when the name is missing.
    #[must_use]
    pub fn title(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.tag,
        }
    }

    /// The canonical artifact of this release: its first asset.
    /// Releases with no assets have nothing to download or check.
    #[must_use]
    pub fn primary_asset(&self) -> Option<&Asset> {
        self.assets.first()
    }

    /// Whether `needle` names this release by tag or title.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.tag.eq_ignore_ascii_case(needle) || self.title().eq_ignore_ascii_case(needle)
    }
}
