//! Application configuration types.
//!
//! Loaded from a TOML file in the data directory; every section has serde
//! defaults so a partial (or missing) file still yields a usable config.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for device monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Interval between device polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl DeviceConfig {
    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

const fn default_poll_interval_ms() -> u64 {
    2000
}

/// Configuration for the remote release catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// GitHub repository owner serving payload releases.
    #[serde(default = "default_catalog_owner")]
    pub owner: String,

    /// GitHub repository name.
    #[serde(default = "default_catalog_repo")]
    pub repo: String,

    /// Number of recent releases to list.
    #[serde(default = "default_catalog_limit")]
    pub limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            owner: default_catalog_owner(),
            repo: default_catalog_repo(),
            limit: default_catalog_limit(),
        }
    }
}

fn default_catalog_owner() -> String {
    "CTCaer".into()
}

fn default_catalog_repo() -> String {
    "hekate".into()
}

const fn default_catalog_limit() -> u32 {
    10
}

/// Configuration for the external injector program.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InjectorConfig {
    /// Program invoked with the payload path as its only argument.
    /// Unset means injection is unavailable until the user configures one.
    #[serde(default)]
    pub command: Option<PathBuf>,
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Base data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Payload cache directory.
    #[serde(default)]
    pub payloads_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Device monitoring configuration.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Release catalog configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Injector configuration.
    #[serde(default)]
    pub injector: InjectorConfig,

    /// Path configuration.
    #[serde(default)]
    pub paths: PathConfig,
}

impl AppConfig {
    /// Get the data directory, using default if not configured.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rcm-manager")
    }

    /// Get the payload store database path.
    #[must_use]
    pub fn store_db_path(&self) -> PathBuf {
        self.data_dir().join("payloads.db")
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_file_path(&self) -> PathBuf {
        self.data_dir().join("config.toml")
    }

    /// Get the payload cache directory. Defaults to a `payloads` folder in
    /// the user's download directory, matching where manual downloads land.
    #[must_use]
    pub fn payloads_dir(&self) -> PathBuf {
        self.paths.payloads_dir.clone().unwrap_or_else(|| {
            dirs::download_dir()
                .unwrap_or_else(|| self.data_dir())
                .join("payloads")
        })
    }
}
