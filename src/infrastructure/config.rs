//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files.

use std::fs;
use std::path::Path;

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# rcm-manager configuration
# Auto-generated - edit as needed

[device]
# Interval between device polls in milliseconds (default: 2000)
poll_interval_ms = 2000

[catalog]
# GitHub repository serving payload releases
owner = "CTCaer"
repo = "hekate"

# Number of recent releases to list (default: 10)
limit = 10

[injector]
# External program used to deliver a payload to a device in RCM.
# It is invoked with the payload path as its only argument.
# command = "fusee-launcher"

[paths]
# Custom data directory (optional, defaults to ~/.rcm-manager)
# data_dir = "/custom/path"

# Custom payload cache directory (optional, defaults to <downloads>/payloads)
# payloads_dir = "/custom/payloads"
"#;

/// Load configuration, preferring an explicit file over the default
/// location. A missing default file yields the default configuration.
///
/// # Errors
/// Returns error if a file exists but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => load_config_from_file(path),
        None => {
            let config_path = AppConfig::default_data_dir().join("config.toml");
            if config_path.exists() {
                load_config_from_file(&config_path)
            } else {
                Ok(AppConfig::default())
            }
        }
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if the file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Create default configuration file if it doesn't exist.
///
/// # Errors
/// Returns error if the file cannot be created.
pub fn ensure_config_exists() -> Result<()> {
    let config_path = AppConfig::default_data_dir().join("config.toml");

    if !config_path.exists() {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create config directory", e))?;
        }

        fs::write(&config_path, DEFAULT_CONFIG)
            .map_err(|e| AppError::io("Failed to create default config", e))?;

        tracing::info!(path = %config_path.display(), "Created default configuration");
    }

    Ok(())
}
