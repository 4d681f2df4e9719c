//! Payload download orchestration.
//!
//! Drives a single asset download to its deterministic cache path and
//! records the result in the ledger before returning. Tracks in-flight
//! transfers per asset id: the same asset can never be downloaded twice
//! concurrently, while unrelated assets may overlap freely.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use crate::domain::{AppError, Asset, Result};
use crate::infrastructure::PayloadStore;

use super::ports::PayloadFetcher;

/// Orchestrates artifact downloads into the payload cache.
pub struct DownloadOrchestrator<F> {
    fetcher: F,
    store: Arc<PayloadStore>,
    payloads_dir: PathBuf,
    in_flight: Mutex<HashSet<u64>>,
}

/// Releases an asset's in-flight slot when the download leaves scope,
/// on success and failure alike.
struct FlightSlot<'a> {
    set: &'a Mutex<HashSet<u64>>,
    id: u64,
}

impl Drop for FlightSlot<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl<F: PayloadFetcher> DownloadOrchestrator<F> {
    /// Create an orchestrator downloading into `payloads_dir`.
    #[must_use]
    pub fn new(fetcher: F, store: Arc<PayloadStore>, payloads_dir: PathBuf) -> Self {
        Self {
            fetcher,
            store,
            payloads_dir,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Asset ids with a transfer currently in flight.
    #[must_use]
    pub fn in_flight_ids(&self) -> HashSet<u64> {
        self.lock_in_flight().clone()
    }

    /// Whether a transfer for `asset_id` is currently in flight.
    #[must_use]
    pub fn is_in_flight(&self, asset_id: u64) -> bool {
        self.lock_in_flight().contains(&asset_id)
    }

    /// Download `asset` into the payload cache.
    ///
    /// A successful return means the bytes are on disk at the returned path
    /// and the ledger entry is already durable. On failure the ledger is
    /// untouched.
    ///
    /// # Errors
    /// Rejects a duplicate request for an asset already in flight before
    /// any transfer starts; surfaces fetch and store failures verbatim.
    pub async fn download(&self, asset: &Asset) -> Result<PathBuf> {
        {
            let mut in_flight = self.lock_in_flight();
            if !in_flight.insert(asset.id) {
                return Err(AppError::precondition(format!(
                    "{} is already downloading",
                    asset.file_name
                )));
            }
        }
        let _slot = FlightSlot {
            set: &self.in_flight,
            id: asset.id,
        };

        let dest = self.payloads_dir.join(&asset.file_name);
        tracing::info!(
            url = %asset.download_url,
            dest = %dest.display(),
            "downloading payload"
        );

        let path = self.fetcher.fetch(&asset.download_url, &dest).await?;
        self.store.record(&asset.file_name, Utc::now())?;

        tracing::info!(path = %path.display(), "payload downloaded");
        Ok(path)
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<u64>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use tempfile::tempdir;

    fn asset(id: u64, file_name: &str) -> Asset {
        Asset {
            id,
            file_name: file_name.into(),
            download_url: format!("https://example.invalid/{file_name}"),
            size_bytes: 4,
        }
    }

    fn open_store(dir: &Path) -> Arc<PayloadStore> {
        Arc::new(PayloadStore::open(&dir.join("payloads.db")).unwrap())
    }

    /// Fetcher that records calls and optionally fails.
    struct MockFetcher {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl PayloadFetcher for MockFetcher {
        fn fetch(&self, _url: &str, dest: &Path) -> impl Future<Output = Result<PathBuf>> + Send {
            let calls = Arc::clone(&self.calls);
            let fail = self.fail;
            let dest = dest.to_path_buf();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(AppError::operation("connection reset"))
                } else {
                    Ok(dest)
                }
            }
        }
    }

    /// Fetcher that parks until released, to hold a transfer in flight.
    struct ParkedFetcher {
        release: Arc<Notify>,
        calls: Arc<AtomicUsize>,
    }

    impl PayloadFetcher for ParkedFetcher {
        fn fetch(&self, _url: &str, dest: &Path) -> impl Future<Output = Result<PathBuf>> + Send {
            let release = Arc::clone(&self.release);
            let calls = Arc::clone(&self.calls);
            let dest = dest.to_path_buf();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                release.notified().await;
                Ok(dest)
            }
        }
    }

    #[tokio::test]
    async fn test_success_records_ledger_before_return() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        let orchestrator = DownloadOrchestrator::new(
            MockFetcher {
                calls: Arc::new(AtomicUsize::new(0)),
                fail: false,
            },
            Arc::clone(&store),
            dir.path().to_path_buf(),
        );

        let payload = asset(1, "hekate.bin");
        let path = orchestrator.download(&payload).await.unwrap();
        assert_eq!(path, dir.path().join("hekate.bin"));
        assert!(store.contains("hekate.bin").unwrap());
        assert!(!orchestrator.is_in_flight(1));
    }

    #[tokio::test]
    async fn test_failure_leaves_ledger_untouched() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        let orchestrator = DownloadOrchestrator::new(
            MockFetcher {
                calls: Arc::new(AtomicUsize::new(0)),
                fail: true,
            },
            Arc::clone(&store),
            dir.path().to_path_buf(),
        );

        let payload = asset(1, "hekate.bin");
        let err = orchestrator.download(&payload).await.unwrap_err();
        assert!(matches!(err, AppError::Operation { .. }));
        assert!(!store.contains("hekate.bin").unwrap());
        assert!(!orchestrator.is_in_flight(1), "slot freed after failure");
    }

    #[tokio::test]
    async fn test_duplicate_download_rejected_while_in_flight() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        let release = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let orchestrator = Arc::new(DownloadOrchestrator::new(
            ParkedFetcher {
                release: Arc::clone(&release),
                calls: Arc::clone(&calls),
            },
            Arc::clone(&store),
            dir.path().to_path_buf(),
        ));

        let payload = asset(1, "hekate.bin");
        let first = {
            let orchestrator = Arc::clone(&orchestrator);
            let payload = payload.clone();
            tokio::spawn(async move { orchestrator.download(&payload).await })
        };

        while !orchestrator.is_in_flight(1) {
            tokio::task::yield_now().await;
        }

        let second = orchestrator.download(&payload).await.unwrap_err();
        assert!(matches!(second, AppError::Precondition { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "primitive reached once");

        release.notify_one();
        first.await.unwrap().unwrap();
        assert!(store.contains("hekate.bin").unwrap());
    }

    #[tokio::test]
    async fn test_distinct_assets_may_overlap() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        let release = Arc::new(Notify::new());
        let orchestrator = Arc::new(DownloadOrchestrator::new(
            ParkedFetcher {
                release: Arc::clone(&release),
                calls: Arc::new(AtomicUsize::new(0)),
            },
            Arc::clone(&store),
            dir.path().to_path_buf(),
        ));

        let first = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.download(&asset(1, "hekate.bin")).await })
        };
        while !orchestrator.is_in_flight(1) {
            tokio::task::yield_now().await;
        }

        let second = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.download(&asset(2, "lockpick.bin")).await })
        };
        while !orchestrator.is_in_flight(2) {
            tokio::task::yield_now().await;
        }
        assert_eq!(orchestrator.in_flight_ids().len(), 2);

        release.notify_waiters();
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert!(store.contains("hekate.bin").unwrap());
        assert!(store.contains("lockpick.bin").unwrap());
    }
}
