//! Device status models.
//!
//! A status snapshot is an immutable value replaced wholesale on each poll;
//! nothing mutates a snapshot in place.

use serde::{Deserialize, Serialize};

/// USB vendor id a Tegra device reports in RCM.
pub const RCM_VENDOR_ID: u16 = 0x0955;
/// USB product id a Tegra device reports in RCM.
pub const RCM_PRODUCT_ID: u16 = 0x7321;
/// USB vendor id of a Switch that booted normally.
pub const NINTENDO_VENDOR_ID: u16 = 0x057E;

/// Mode the observed device is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    /// No device observed.
    None,
    /// Device is in RCM and can accept a payload.
    Recovery,
    /// Device is attached but booted normally; the user has to reboot it
    /// into RCM before anything can be injected.
    Normal,
}

impl std::fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "no device"),
            Self::Recovery => write!(f, "RCM"),
            Self::Normal => write!(f, "normal boot"),
        }
    }
}

/// Identity of an enumerated USB device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// USB vendor id.
    pub vendor_id: u16,
    /// USB product id.
    pub product_id: u16,
    /// Manufacturer string, when the descriptor could be read.
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Product string, when the descriptor could be read.
    #[serde(default)]
    pub product: Option<String>,
    /// Serial number string, when the descriptor could be read.
    #[serde(default)]
    pub serial: Option<String>,
}

/// Snapshot of the monitored device, replaced on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Whether a relevant device is attached at all.
    pub present: bool,
    /// Mode the device is in.
    pub mode: DeviceMode,
    /// Identity details when a device is present.
    pub identity: Option<DeviceIdentity>,
}

impl DeviceStatus {
    /// No relevant device attached. A device disappearing mid-poll lands
    /// here; it is a status, not an error.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            present: false,
            mode: DeviceMode::None,
            identity: None,
        }
    }

    /// Device observed in RCM.
    #[must_use]
    pub const fn recovery(identity: Option<DeviceIdentity>) -> Self {
        Self {
            present: true,
            mode: DeviceMode::Recovery,
            identity,
        }
    }

    /// Device observed, but booted normally.
    #[must_use]
    pub const fn normal(identity: Option<DeviceIdentity>) -> Self {
        Self {
            present: true,
            mode: DeviceMode::Normal,
            identity,
        }
    }

    /// Whether a payload could be delivered right now.
    #[must_use]
    pub fn is_recovery(&self) -> bool {
        self.mode == DeviceMode::Recovery
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self::absent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_status() {
        let status = DeviceStatus::absent();
        assert!(!status.present);
        assert_eq!(status.mode, DeviceMode::None);
        assert!(status.identity.is_none());
        assert!(!status.is_recovery());
    }

    #[test]
    fn test_recovery_status() {
        let status = DeviceStatus::recovery(None);
        assert!(status.present);
        assert!(status.is_recovery());
    }

    #[test]
    fn test_normal_is_distinct_from_absent() {
        let normal = DeviceStatus::normal(None);
        assert!(normal.present);
        assert!(!normal.is_recovery());
        assert_ne!(normal, DeviceStatus::absent());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(DeviceMode::None.to_string(), "no device");
        assert_eq!(DeviceMode::Recovery.to_string(), "RCM");
        assert_eq!(DeviceMode::Normal.to_string(), "normal boot");
    }
}
