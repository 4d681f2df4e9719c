//! Domain layer - core models and types.
//!
//! This layer contains pure domain models and error types
//! without any external dependencies (USB, network, IO).

pub mod config;
pub mod device;
pub mod error;
pub mod injection;
pub mod release;

pub use config::{AppConfig, CatalogConfig, DeviceConfig, InjectorConfig, PathConfig};
pub use device::{
    DeviceIdentity, DeviceMode, DeviceStatus, NINTENDO_VENDOR_ID, RCM_PRODUCT_ID, RCM_VENDOR_ID,
};
pub use error::{AppError, Result};
pub use injection::InjectionState;
pub use release::{Asset, ReleaseEntry};
