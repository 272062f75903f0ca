//! The data sources of the machine we are running on.
//!
//! On Windows these are the real registry and WMI. Elsewhere there is nothing
//! to read, so empty in-memory sources are used and every lookup ends in its
//! "not found" text.

#[cfg(target_os = "windows")]
mod windows;

use std::env;

use crate::inventory::{InventoryQuery, MemoryInventory};
use crate::network::{AdapterInfo, AdapterSource};
use crate::registry::{MemoryRegistry, RegistryStore};

/// Boxed data sources handed to the probe.
pub struct SystemSources {
    pub registry: Box<dyn RegistryStore>,
    pub inventory: Box<dyn InventoryQuery>,
    pub adapters: Box<dyn AdapterSource>,
}

/// Sources for the current platform.
pub fn system_sources() -> SystemSources {
    #[cfg(target_os = "windows")]
    {
        windows::sources()
    }
    #[cfg(not(target_os = "windows"))]
    {
        log::info!("Not running on Windows, registry and WMI lookups will come back empty");
        empty_sources()
    }
}

/// Sources with nothing in them.
pub fn empty_sources() -> SystemSources {
    SystemSources {
        registry: Box::new(MemoryRegistry::new()),
        inventory: Box::new(MemoryInventory::new()),
        adapters: Box::new(Vec::<AdapterInfo>::new()),
    }
}

/// Name of this machine.
///
/// Asks the OS first, then the `COMPUTERNAME` and `HOSTNAME` environment
/// variables, and settles for `unknown-host`.
pub fn host_name() -> String {
    sysinfo::System::host_name()
        .or_else(|| env::var("COMPUTERNAME").ok())
        .or_else(|| env::var("HOSTNAME").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string())
}
