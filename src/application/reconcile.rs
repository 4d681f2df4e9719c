//! Reconciliation between the remote catalog, the ledger and the disk.
//!
//! Disk existence is the authoritative fact; the ledger only caches what a
//! reconciliation pass has confirmed. Files deleted behind the tool's back
//! are therefore never reported as available.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::{ReleaseEntry, Result};
use crate::infrastructure::PayloadStore;

/// Cross-checks a catalog snapshot against the payload cache on disk and
/// folds the confirmed set into the ledger.
pub struct ReconciliationEngine {
    store: Arc<PayloadStore>,
    payloads_dir: PathBuf,
}

impl ReconciliationEngine {
    /// Create an engine checking files under `payloads_dir`.
    #[must_use]
    pub const fn new(store: Arc<PayloadStore>, payloads_dir: PathBuf) -> Self {
        Self {
            store,
            payloads_dir,
        }
    }

    /// Confirm which catalog artifacts are present on disk right now.
    ///
    /// Each release's primary asset is checked at its deterministic cache
    /// path; releases without assets are skipped. The confirmed names are
    /// merged into the ledger (merge only ever adds) and returned.
    ///
    /// # Errors
    /// Returns a store error if the merge fails.
    pub fn reconcile(&self, catalog: &[ReleaseEntry]) -> Result<BTreeSet<String>> {
        let mut confirmed = BTreeSet::new();

        for release in catalog {
            let Some(asset) = release.primary_asset() else {
                continue;
            };
            if self.payloads_dir.join(&asset.file_name).is_file() {
                confirmed.insert(asset.file_name.clone());
            }
        }

        if !confirmed.is_empty() {
            self.store.merge(&confirmed)?;
        }

        tracing::debug!(
            catalog = catalog.len(),
            confirmed = confirmed.len(),
            "reconciled payload cache"
        );

        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::tempdir;

    use crate::domain::Asset;

    fn release(id: u64, file_name: &str) -> ReleaseEntry {
        ReleaseEntry {
            id,
            display_name: None,
            tag: format!("v{id}"),
            published_at: None,
            assets: vec![Asset {
                id: id * 10,
                file_name: file_name.into(),
                download_url: format!("https://example.invalid/{file_name}"),
                size_bytes: 4,
            }],
        }
    }

    fn engine(dir: &std::path::Path) -> (ReconciliationEngine, Arc<PayloadStore>) {
        let store = Arc::new(PayloadStore::open(&dir.join("payloads.db")).unwrap());
        let payloads = dir.join("payloads");
        fs::create_dir_all(&payloads).unwrap();
        (
            ReconciliationEngine::new(Arc::clone(&store), payloads),
            store,
        )
    }

    #[test]
    fn test_absent_file_yields_empty_set_and_untouched_ledger() {
        let dir = tempdir().unwrap();
        let (engine, store) = engine(dir.path());

        let confirmed = engine.reconcile(&[release(1, "hekate.bin")]).unwrap();
        assert!(confirmed.is_empty());
        assert!(!store.contains("hekate.bin").unwrap());
    }

    #[test]
    fn test_present_file_is_confirmed_and_recorded() {
        let dir = tempdir().unwrap();
        let (engine, store) = engine(dir.path());
        fs::write(dir.path().join("payloads/hekate.bin"), b"data").unwrap();

        let confirmed = engine.reconcile(&[release(1, "hekate.bin")]).unwrap();
        assert_eq!(confirmed, BTreeSet::from(["hekate.bin".to_string()]));
        assert!(store.contains("hekate.bin").unwrap());
    }

    #[test]
    fn test_reconcile_is_idempotent_and_never_loses_entries() {
        let dir = tempdir().unwrap();
        let (engine, store) = engine(dir.path());
        fs::write(dir.path().join("payloads/hekate.bin"), b"data").unwrap();
        store
            .record("earlier.bin", chrono::Utc::now())
            .unwrap();

        let catalog = [release(1, "hekate.bin")];
        let first = engine.reconcile(&catalog).unwrap();
        let second = engine.reconcile(&catalog).unwrap();
        assert_eq!(first, second);

        // Merge only adds: the entry recorded before reconciliation stays.
        let all = store.downloaded_set().unwrap();
        assert!(all.contains("earlier.bin"));
        assert!(all.contains("hekate.bin"));
    }

    #[test]
    fn test_release_without_assets_is_skipped() {
        let dir = tempdir().unwrap();
        let (engine, _store) = engine(dir.path());
        let empty = ReleaseEntry {
            id: 1,
            display_name: None,
            tag: "v1".into(),
            published_at: None,
            assets: Vec::new(),
        };

        let confirmed = engine.reconcile(&[empty]).unwrap();
        assert!(confirmed.is_empty());
    }
}
