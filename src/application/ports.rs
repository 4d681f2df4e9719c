//! Ports consumed by the application services.
//!
//! The native USB protocol, the injection primitive and the byte transfer
//! live behind these traits; infrastructure provides the real adapters and
//! tests substitute mocks.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::domain::{DeviceIdentity, DeviceStatus, Result};

/// Native device scan primitive.
pub trait DeviceScanner: Send + Sync {
    /// Scan once for the monitored device. An absent device is a status,
    /// not an error; enumeration failure is a transient error.
    fn scan(&self) -> Result<DeviceStatus>;

    /// Enumerate all attached USB devices for the auxiliary listing view.
    fn list_devices(&self) -> Result<Vec<DeviceIdentity>>;
}

/// Native privileged injection primitive. Non-reentrant, may take
/// arbitrarily long, has no partial state visible to the caller.
pub trait PayloadInjector: Send + Sync {
    /// Deliver the payload at `payload` to the device in RCM.
    fn inject(&self, payload: &Path) -> Result<String>;
}

/// Native byte-transfer primitive for a single artifact download.
///
/// Partial/temporary files are this primitive's responsibility; on failure
/// the destination must not be left half-written.
pub trait PayloadFetcher: Send + Sync {
    /// Download `url` to `dest`, returning the final local path.
    fn fetch(&self, url: &str, dest: &Path) -> impl Future<Output = Result<PathBuf>> + Send;
}
