//! Network adapter enumeration and MAC address formatting.

use crate::errors::InventoryResult;
use crate::inventory::InventoryQuery;

/// Query used by [`WmiAdapterSource`].
pub const ADAPTER_QUERY: &str =
    "SELECT Description, MACAddress, NetConnectionStatus FROM Win32_NetworkAdapter";

/// `NetConnectionStatus` value for a connected adapter.
const STATUS_CONNECTED: &str = "2";

/// Descriptions containing any of these are virtual or tunnel adapters.
const VIRTUAL_MARKERS: [&str; 2] = ["Virtual", "Pseudo"];

/// A network adapter as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub is_up: bool,
    pub description: String,
    pub physical_address: Vec<u8>,
}

impl AdapterInfo {
    /// True for an operational adapter that is not virtual and has a full
    /// six-byte hardware address.
    pub fn is_physical_candidate(&self) -> bool {
        self.is_up
            && !VIRTUAL_MARKERS
                .iter()
                .any(|marker| self.description.contains(marker))
            && self.physical_address.len() >= 6
    }
}

/// Source of network adapters.
pub trait AdapterSource {
    fn adapters(&self) -> InventoryResult<Vec<AdapterInfo>>;
}

impl AdapterSource for Vec<AdapterInfo> {
    fn adapters(&self) -> InventoryResult<Vec<AdapterInfo>> {
        Ok(self.clone())
    }
}

/// Adapters read from `Win32_NetworkAdapter`.
#[derive(Debug, Clone, Default)]
pub struct WmiAdapterSource<Q> {
    query: Q,
}

impl<Q: InventoryQuery> WmiAdapterSource<Q> {
    pub fn new(query: Q) -> Self {
        Self { query }
    }
}

impl<Q: InventoryQuery> AdapterSource for WmiAdapterSource<Q> {
    fn adapters(&self) -> InventoryResult<Vec<AdapterInfo>> {
        let rows = self.query.query(ADAPTER_QUERY)?;

        Ok(rows
            .into_iter()
            .map(|row| AdapterInfo {
                is_up: row.get("NetConnectionStatus").map(String::as_str)
                    == Some(STATUS_CONNECTED),
                description: row.get("Description").cloned().unwrap_or_default(),
                physical_address: row
                    .get("MACAddress")
                    .and_then(|mac| parse_mac(mac))
                    .unwrap_or_default(),
            })
            .collect())
    }
}

/// Parse a MAC address written as hex pairs, with or without `:`/`-` separators.
pub fn parse_mac(text: &str) -> Option<Vec<u8>> {
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | ' '))
        .collect();
    hex::decode(digits).ok()
}

/// Format a hardware address as uppercase hex pairs joined by dashes,
/// e.g. `AA-BB-CC-DD-EE-FF`.
pub fn format_mac(address: &[u8]) -> String {
    address
        .iter()
        .map(|byte| hex::encode_upper([*byte]))
        .collect::<Vec<_>>()
        .join("-")
}

/// Pick the first adapter that qualifies as the machine's primary physical
/// adapter and return its formatted MAC address.
pub fn select_primary_mac(adapters: &[AdapterInfo]) -> Option<String> {
    adapters
        .iter()
        .find(|adapter| adapter.is_physical_candidate())
        .map(|adapter| format_mac(&adapter.physical_address))
}
