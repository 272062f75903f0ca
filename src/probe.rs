//! Lookup chains that gather the facts for the report.
//!
//! Each public operation on [`SystemProbe`] tries its sources in a fixed order
//! and always returns text: when every source fails, the result is one of the
//! sentinel strings below rather than an error.

use std::fs;
use std::path::Path;

use crate::config::OfficeCatalog;
use crate::inventory::InventoryQuery;
use crate::network::{select_primary_mac, AdapterSource};
use crate::registry::RegistryStore;

mod office;
mod os;
mod windows_key;

pub use office::{is_valid_office_product, office_version_label, OfficeFacts};
pub use os::{relabel_for_build, relabel_for_version, OsFacts, CURRENT_VERSION_KEY};

/// OS version could not be read from any source.
pub const OS_UNDETERMINED: &str = "Unable to determine OS version";

/// No Windows product key was found.
pub const KEY_NOT_FOUND: &str = "Product key not found";

/// A value could not be read (Office key, MAC address).
pub const NOT_AVAILABLE: &str = "Unable to retrieve";

/// No Office installation was found.
pub const OFFICE_NOT_INSTALLED: &str = "Not installed";

/// Office registration without a `LicenseType` value.
pub const UNKNOWN_LICENSE: &str = "Unknown";

/// Returns true when `path` is a directory with at least one entry.
pub fn directory_has_content(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Runs the lookup chains against a set of sources.
pub struct SystemProbe<'a> {
    registry: &'a dyn RegistryStore,
    inventory: &'a dyn InventoryQuery,
    adapters: &'a dyn AdapterSource,
    catalog: &'a OfficeCatalog,
    directory_check: fn(&Path) -> bool,
}

impl<'a> SystemProbe<'a> {
    pub fn new(
        registry: &'a dyn RegistryStore,
        inventory: &'a dyn InventoryQuery,
        adapters: &'a dyn AdapterSource,
        catalog: &'a OfficeCatalog,
    ) -> Self {
        Self {
            registry,
            inventory,
            adapters,
            catalog,
            directory_check: directory_has_content,
        }
    }

    /// Replace the check used for the Office install directories.
    pub fn with_directory_check(mut self, check: fn(&Path) -> bool) -> Self {
        self.directory_check = check;
        self
    }

    /// MAC address of the first operational, non-virtual adapter.
    pub fn mac_address(&self) -> String {
        match self.adapters.adapters() {
            Ok(adapters) => select_primary_mac(&adapters).unwrap_or_else(|| {
                log::debug!("No adapter qualified among {} found", adapters.len());
                NOT_AVAILABLE.to_string()
            }),
            Err(e) => {
                log::warn!("Failed to enumerate network adapters: {e}");
                NOT_AVAILABLE.to_string()
            }
        }
    }
}
