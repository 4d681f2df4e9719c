//! Payload selection.
//!
//! Binds a local artifact path to the upcoming injection. Selection is
//! orthogonal to device state: it can change at any time and is only
//! validated against the device by the injection guard at start time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::{AppError, Result};
use crate::infrastructure::PayloadStore;

/// Holds the current payload selection.
pub struct PayloadSelector {
    store: Arc<PayloadStore>,
    payloads_dir: PathBuf,
}

impl PayloadSelector {
    /// Create a selector resolving cache names under `payloads_dir`.
    #[must_use]
    pub const fn new(store: Arc<PayloadStore>, payloads_dir: PathBuf) -> Self {
        Self {
            store,
            payloads_dir,
        }
    }

    /// Select a manually browsed payload, unconditionally replacing the
    /// current selection.
    ///
    /// # Errors
    /// Returns a store error if the selection cannot be persisted.
    pub fn select_manual(&self, path: &Path) -> Result<()> {
        self.store.set_selection(path)?;
        tracing::info!(payload = %path.display(), "payload selected");
        Ok(())
    }

    /// Select a payload from the download cache by file name.
    ///
    /// The file's presence is re-checked on disk right now; a ledger entry
    /// alone is never enough for the hand-off to injection.
    ///
    /// # Errors
    /// Rejects a name whose file is not actually present in the cache.
    pub fn select_from_cache(&self, file_name: &str) -> Result<PathBuf> {
        let path = self.payloads_dir.join(file_name);
        if !path.is_file() {
            return Err(AppError::precondition(format!(
                "{file_name} is not present in the payload cache; download it first"
            )));
        }
        self.store.set_selection(&path)?;
        tracing::info!(payload = %path.display(), "payload selected from cache");
        Ok(path)
    }

    /// Clear the current selection.
    ///
    /// # Errors
    /// Returns a store error if the cleared state cannot be persisted.
    pub fn clear(&self) -> Result<()> {
        self.store.clear_selection()
    }

    /// The currently selected payload path, if any.
    ///
    /// # Errors
    /// Returns a store error if the selection cannot be read.
    pub fn current(&self) -> Result<Option<PathBuf>> {
        self.store.selection()
    }
}
