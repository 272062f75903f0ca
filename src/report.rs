//! Report assembly and output.
//!
//! The report is plain UTF-8 text with three labelled sections (system, Office,
//! network) and the collection time. It is written to
//! `<prefix>_<host name>.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::errors::InventoryResult;
use crate::probe::{OfficeFacts, SystemProbe};

const SECTION_RULE: &str = "-------------------";

/// Timestamp layout used in the report.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything that goes into the report file.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemReport {
    pub host_name: String,
    pub os_version: String,
    pub windows_key: String,
    pub office: OfficeFacts,
    pub mac_address: String,
    pub collected_at: DateTime<Local>,
}

/// Run every lookup in order: OS, Windows key, Office, MAC address.
pub fn collect_report(
    probe: &SystemProbe<'_>,
    host_name: &str,
    now: DateTime<Local>,
) -> SystemReport {
    let os_version = probe.os_version();
    log::info!("OS: {os_version}");

    let windows_key = probe.windows_product_key();
    let office = probe.office_info();
    log::info!("Office: {}", office.version);

    let mac_address = probe.mac_address();

    SystemReport {
        host_name: host_name.to_string(),
        os_version,
        windows_key,
        office,
        mac_address,
        collected_at: now,
    }
}

/// Report file name for `host_name`.
///
/// Characters Windows does not allow in file names are replaced with `_`.
pub fn report_file_name(prefix: &str, host_name: &str) -> String {
    let host: String = host_name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{prefix}_{host}.txt")
}

impl SystemReport {
    /// Render the report text.
    pub fn render(&self) -> String {
        let lines = [
            "System information".to_string(),
            SECTION_RULE.to_string(),
            format!("Computer name: {}", self.host_name),
            format!("OS: {}", self.os_version),
            format!("Windows key: {}", self.windows_key),
            String::new(),
            "Office information".to_string(),
            SECTION_RULE.to_string(),
            format!("Version: {}", self.office.version),
            format!("License type: {}", self.office.license_type),
            format!("Product key: {}", self.office.product_key),
            String::new(),
            "Network".to_string(),
            SECTION_RULE.to_string(),
            format!("MAC address: {}", self.mac_address),
            String::new(),
            format!("Collected at: {}", self.collected_at.format(TIMESTAMP_FORMAT)),
            String::new(),
        ];
        lines.join("\n")
    }

    /// Write the report into `directory` and return the file's path.
    pub fn write_to(&self, directory: &Path, prefix: &str) -> InventoryResult<PathBuf> {
        let path = directory.join(report_file_name(prefix, &self.host_name));
        let text = self.render();
        fs::write(&path, &text)?;
        log::debug!("Wrote {} bytes to {}", text.len(), path.display());
        Ok(path)
    }
}
