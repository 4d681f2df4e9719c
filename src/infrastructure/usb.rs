//! USB device enumeration.
//!
//! Classifies attached devices by descriptor: the RCM vendor/product pair
//! means a payload can be delivered, the Nintendo vendor id alone means the
//! console booted normally and has to be rebooted into RCM first.

use rusb::{Device, DeviceDescriptor, GlobalContext};

use crate::application::DeviceScanner;
use crate::domain::{
    AppError, DeviceIdentity, DeviceStatus, Result, NINTENDO_VENDOR_ID, RCM_PRODUCT_ID,
    RCM_VENDOR_ID,
};

/// Upper bound on descriptors inspected per enumeration pass.
const MAX_DEVICES: usize = 50;

/// rusb-backed device scanner.
#[derive(Debug, Default, Clone, Copy)]
pub struct UsbScanner;

impl UsbScanner {
    /// Create a scanner over the global USB context.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Read the string descriptors for a device, best effort. Devices that
    /// refuse to open still get a vendor/product-only identity.
    fn identity(device: &Device<GlobalContext>, desc: &DeviceDescriptor) -> DeviceIdentity {
        let handle = device.open().ok();

        DeviceIdentity {
            vendor_id: desc.vendor_id(),
            product_id: desc.product_id(),
            manufacturer: handle
                .as_ref()
                .and_then(|h| h.read_manufacturer_string_ascii(desc).ok()),
            product: handle
                .as_ref()
                .and_then(|h| h.read_product_string_ascii(desc).ok()),
            serial: handle
                .as_ref()
                .and_then(|h| h.read_serial_number_string_ascii(desc).ok()),
        }
    }
}

impl DeviceScanner for UsbScanner {
    fn scan(&self) -> Result<DeviceStatus> {
        let devices = rusb::devices()
            .map_err(|e| AppError::transient(format!("USB enumeration failed: {e}")))?;

        // An RCM device wins over a normally booted console when both are
        // attached.
        for device in devices.iter().take(MAX_DEVICES) {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            if desc.vendor_id() == RCM_VENDOR_ID && desc.product_id() == RCM_PRODUCT_ID {
                return Ok(DeviceStatus::recovery(Some(Self::identity(&device, &desc))));
            }
        }

        for device in devices.iter().take(MAX_DEVICES) {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            if desc.vendor_id() == NINTENDO_VENDOR_ID {
                return Ok(DeviceStatus::normal(Some(Self::identity(&device, &desc))));
            }
        }

        Ok(DeviceStatus::absent())
    }

    fn list_devices(&self) -> Result<Vec<DeviceIdentity>> {
        let devices = rusb::devices()
            .map_err(|e| AppError::transient(format!("USB enumeration failed: {e}")))?;

        let mut listing = Vec::new();
        for device in devices.iter().take(MAX_DEVICES) {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            // Skip placeholder descriptors
            if desc.vendor_id() == 0 || desc.product_id() == 0 {
                continue;
            }
            listing.push(Self::identity(&device, &desc));
        }

        Ok(listing)
    }
}
