//! Application layer - the controller's services.
//!
//! Device monitoring, injection arbitration, cache reconciliation,
//! download orchestration and payload selection.

pub mod downloads;
pub mod formatter;
pub mod injection;
pub mod monitor;
pub mod overview;
pub mod ports;
pub mod reconcile;
pub mod selection;

pub use downloads::DownloadOrchestrator;
pub use formatter::{format_devices_table, format_releases_table, format_status};
pub use injection::InjectionGuard;
pub use monitor::DeviceMonitor;
pub use overview::{build_overview, ReleaseOverview};
pub use ports::{DeviceScanner, PayloadFetcher, PayloadInjector};
pub use reconcile::ReconciliationEngine;
pub use selection::PayloadSelector;
