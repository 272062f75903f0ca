//! Office detection.
//!
//! Office leaves many registrations behind that are not the suite itself:
//! proofing tools, language packs, file-format converters. The scan therefore
//! runs in phases, each one stricter about what counts:
//!
//! 1. a cheap presence check over a few registry keys and install directories,
//! 2. the MSI registration scan, newest release first, with allow/deny lists,
//! 3. the Click-to-Run configuration key.

use std::path::Path;

use crate::config::OfficeCatalog;
use crate::probe::{SystemProbe, NOT_AVAILABLE, OFFICE_NOT_INSTALLED, UNKNOWN_LICENSE};
use crate::product_key::decode_office_key;

const CLICK_TO_RUN_VERSION: &str = "Microsoft 365 Apps for enterprise (Click-to-Run)";
const CLICK_TO_RUN_LICENSE: &str = "Digital license";
const CLICK_TO_RUN_KEY: &str = "Key is stored in the Microsoft account";

/// Office version, license type and product key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeFacts {
    pub version: String,
    pub license_type: String,
    pub product_key: String,
}

impl OfficeFacts {
    /// `("Not installed", "", "")`.
    pub fn not_installed() -> Self {
        Self {
            version: OFFICE_NOT_INSTALLED.to_string(),
            license_type: String::new(),
            product_key: String::new(),
        }
    }

    fn click_to_run() -> Self {
        Self {
            version: CLICK_TO_RUN_VERSION.to_string(),
            license_type: CLICK_TO_RUN_LICENSE.to_string(),
            product_key: CLICK_TO_RUN_KEY.to_string(),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.version != OFFICE_NOT_INSTALLED
    }
}

/// Decide whether a registration entry describes an actual Office product.
///
/// The product name must mention one of the allowed products and none of the
/// excluded ones. When a product id is present it must also look like an Office
/// id.
pub fn is_valid_office_product(
    catalog: &OfficeCatalog,
    product_name: &str,
    product_id: &str,
) -> bool {
    if product_name.trim().is_empty() {
        return false;
    }

    let allowed = catalog
        .allowed_products
        .iter()
        .any(|p| product_name.contains(p.as_str()));
    let excluded = catalog
        .excluded_products
        .iter()
        .any(|p| product_name.contains(p.as_str()));
    if !allowed || excluded {
        return false;
    }

    if product_id.trim().is_empty() {
        return true;
    }
    product_id.starts_with(catalog.product_id_prefix.as_str())
        || catalog
            .product_id_markers
            .iter()
            .any(|m| product_id.contains(m.as_str()))
}

/// `<product name> (<release name>)`, with ` LTSC` added to the release name
/// for LTSC products.
pub fn office_version_label(
    catalog: &OfficeCatalog,
    release_id: &str,
    product_name: &str,
) -> String {
    let mut release = catalog.release_name(release_id).to_string();
    if product_name.contains("LTSC") {
        release.push_str(" LTSC");
    }
    format!("{product_name} ({release})")
}

impl SystemProbe<'_> {
    /// Office version, license type and key.
    pub fn office_info(&self) -> OfficeFacts {
        if !self.office_likely_installed() {
            log::debug!("No trace of Office, skipping registration scan");
            return OfficeFacts::not_installed();
        }

        if let Some(facts) = self.traditional_office() {
            return facts;
        }
        if let Some(facts) = self.click_to_run_office() {
            return facts;
        }

        OfficeFacts::not_installed()
    }

    /// Quick check over the presence keys and directories.
    pub fn office_likely_installed(&self) -> bool {
        let key_present = self.catalog.presence_registry_keys.iter().any(|path| {
            match self.registry.subkeys(path) {
                Ok(Some(subkeys)) => !subkeys.is_empty(),
                Ok(None) => false,
                Err(e) => {
                    log::debug!("Enumerating {path} failed: {e}");
                    false
                }
            }
        });

        key_present
            || self
                .catalog
                .presence_directories
                .iter()
                .any(|dir| (self.directory_check)(Path::new(dir)))
    }

    fn traditional_office(&self) -> Option<OfficeFacts> {
        for release in &self.catalog.releases {
            for path in self.catalog.registration_paths(&release.id) {
                let entries = match self.registry.subkeys(&path) {
                    Ok(Some(entries)) => entries,
                    Ok(None) => continue,
                    Err(e) => {
                        log::warn!("Enumerating {path} failed: {e}");
                        continue;
                    }
                };

                for entry in entries.iter().filter(|name| name.starts_with('{')) {
                    let entry_path = format!(r"{path}\{entry}");
                    if let Some(facts) = self.registration_entry(&entry_path, &release.id) {
                        return Some(facts);
                    }
                }
            }
        }
        None
    }

    fn registration_entry(&self, path: &str, release_id: &str) -> Option<OfficeFacts> {
        let product_name = self.registry.text(path, "ProductName").unwrap_or_default();
        let product_id = self.registry.text(path, "ProductId").unwrap_or_default();

        if !is_valid_office_product(self.catalog, &product_name, &product_id) {
            log::debug!("Skipping non-Office registration {path} ({product_name:?})");
            return None;
        }

        let license_type = self
            .registry
            .text(path, "LicenseType")
            .unwrap_or_else(|| UNKNOWN_LICENSE.to_string());

        let product_key = match self.registry.value(path, "DigitalProductId") {
            Ok(Some(value)) => match value.as_bytes() {
                Some(bytes) => decode_office_key(bytes),
                None => NOT_AVAILABLE.to_string(),
            },
            Ok(None) => NOT_AVAILABLE.to_string(),
            Err(e) => {
                log::warn!("Reading DigitalProductId under {path} failed: {e}");
                NOT_AVAILABLE.to_string()
            }
        };

        Some(OfficeFacts {
            version: office_version_label(self.catalog, release_id, &product_name),
            license_type,
            product_key,
        })
    }

    fn click_to_run_office(&self) -> Option<OfficeFacts> {
        let key = self.catalog.click_to_run_key.as_str();
        let release_ids = self.registry.text(key, "ProductReleaseIds")?;

        if let Some(version) = self.registry.text(key, "VersionToReport") {
            log::debug!("Click-to-Run reports version {version}, releases {release_ids}");
        }

        let token = self.catalog.click_to_run_token.as_str();
        if release_ids.trim().is_empty() || !release_ids.contains(token) {
            return None;
        }
        Some(OfficeFacts::click_to_run())
    }
}
