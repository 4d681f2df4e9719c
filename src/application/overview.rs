//! Catalog view assembly.
//!
//! Combines a fresh catalog snapshot with the reconciled ledger and the
//! orchestrator's in-flight set into per-release rows for presentation.

use std::collections::{BTreeSet, HashSet};

use crate::domain::ReleaseEntry;

/// One catalog row with its local cache flags.
#[derive(Debug, Clone)]
pub struct ReleaseOverview {
    /// The remote release.
    pub release: ReleaseEntry,
    /// Whether its primary asset is confirmed present on disk.
    pub downloaded: bool,
    /// Whether a transfer for its primary asset is currently in flight.
    pub in_flight: bool,
    /// Whether this is the newest release in the catalog.
    pub recommended: bool,
}

/// Build overview rows from a catalog snapshot (newest first), the set of
/// file names confirmed on disk, and the in-flight asset ids.
#[must_use]
pub fn build_overview(
    releases: Vec<ReleaseEntry>,
    downloaded: &BTreeSet<String>,
    in_flight: &HashSet<u64>,
) -> Vec<ReleaseOverview> {
    releases
        .into_iter()
        .enumerate()
        .map(|(index, release)| {
            let (is_downloaded, is_in_flight) = release.primary_asset().map_or(
                (false, false),
                |asset| {
                    (
                        downloaded.contains(&asset.file_name),
                        in_flight.contains(&asset.id),
                    )
                },
            );
            ReleaseOverview {
                release,
                downloaded: is_downloaded,
                in_flight: is_in_flight,
                recommended: index == 0,
            }
        })
        .collect()
}
