//! Output formatting for device and catalog views.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{DeviceIdentity, DeviceMode, DeviceStatus};

use super::overview::ReleaseOverview;

/// Formats a device status snapshot as a short colored report.
#[must_use]
pub fn format_status(status: &DeviceStatus) -> String {
    let mut out = String::new();

    let line = match status.mode {
        DeviceMode::Recovery => format!("{} Switch in RCM mode detected", "✓".green().bold()),
        DeviceMode::Normal => format!(
            "{} Switch detected but not in RCM mode; reboot it into RCM before injecting",
            "!".yellow().bold()
        ),
        DeviceMode::None => format!("{} no Switch found", "✗".red().bold()),
    };
    out.push_str(&line);

    if let Some(identity) = &status.identity {
        out.push_str(&format!(
            "\n    vendor 0x{:04X} | product 0x{:04X}",
            identity.vendor_id, identity.product_id
        ));
        if let Some(manufacturer) = &identity.manufacturer {
            out.push_str(&format!("\n    manufacturer: {manufacturer}"));
        }
        if let Some(product) = &identity.product {
            out.push_str(&format!("\n    product: {product}"));
        }
        if let Some(serial) = &identity.serial {
            out.push_str(&format!("\n    serial: {serial}"));
        }
    }

    out
}

/// Formats a table listing of enumerated USB devices.
#[must_use]
pub fn format_devices_table(devices: &[DeviceIdentity]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Vendor", "Product", "Manufacturer", "Name", "Serial"]);

    for device in devices {
        table.add_row(vec![
            format!("0x{:04X}", device.vendor_id),
            format!("0x{:04X}", device.product_id),
            device.manufacturer.clone().unwrap_or_else(|| "-".into()),
            device.product.clone().unwrap_or_else(|| "-".into()),
            device.serial.clone().unwrap_or_else(|| "-".into()),
        ]);
    }

    table.to_string()
}

/// Formats a table of catalog releases with their local cache flags.
#[must_use]
pub fn format_releases_table(rows: &[ReleaseOverview]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Tag", "Published", "Payload", "Size", "Status"]);

    for row in rows {
        let published = row.release.published_at.map_or_else(
            || "-".to_string(),
            |dt| dt.format("%Y-%m-%d").to_string(),
        );

        let (payload, size) = row.release.primary_asset().map_or_else(
            || ("-".to_string(), "-".to_string()),
            |asset| (truncate(&asset.file_name, 30), format_bytes(asset.size_bytes)),
        );

        let status = if row.in_flight {
            "downloading".to_string()
        } else if row.downloaded {
            "downloaded".to_string()
        } else {
            "-".to_string()
        };

        let tag = if row.recommended {
            format!("{} (latest)", row.release.tag)
        } else {
            row.release.tag.clone()
        };

        table.add_row(vec![&tag, &published, &payload, &size, &status]);
    }

    table.to_string()
}

/// Format bytes as human readable string.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hekate.bin", 30), "hekate.bin");
        assert_eq!(truncate("a-very-long-payload-name.bin", 10), "a-very-...");
    }

    #[test]
    fn test_status_report_mentions_mode() {
        let report = format_status(&DeviceStatus::absent());
        assert!(report.contains("no Switch found"));

        let report = format_status(&DeviceStatus::normal(None));
        assert!(report.contains("not in RCM"));
    }
}
