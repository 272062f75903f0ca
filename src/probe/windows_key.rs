use crate::probe::os::CURRENT_VERSION_KEY;
use crate::probe::{SystemProbe, KEY_NOT_FOUND};
use crate::product_key::{decode_windows_key, is_well_formed_key, KEY_BUFFER_LEN};

const LICENSING_QUERY: &str = "SELECT OA3xOriginalProductKey FROM SoftwareLicensingService";

impl SystemProbe<'_> {
    /// Windows product key.
    ///
    /// Decodes `DigitalProductId` from the registry when it is present and long
    /// enough, otherwise returns the OEM key reported by the licensing service,
    /// otherwise [`KEY_NOT_FOUND`].
    pub fn windows_product_key(&self) -> String {
        if let Some(key) = self.registry_windows_key() {
            return key;
        }
        log::debug!("No usable DigitalProductId, querying SoftwareLicensingService");

        if let Some(key) = self.licensing_service_key() {
            return key;
        }

        KEY_NOT_FOUND.to_string()
    }

    fn registry_windows_key(&self) -> Option<String> {
        let value = match self.registry.value(CURRENT_VERSION_KEY, "DigitalProductId") {
            Ok(value) => value?,
            Err(e) => {
                log::warn!("Reading DigitalProductId failed: {e}");
                return None;
            }
        };

        match value.as_bytes() {
            Some(bytes) if bytes.len() >= KEY_BUFFER_LEN => Some(decode_windows_key(bytes)),
            Some(bytes) => {
                log::debug!("DigitalProductId is only {} bytes", bytes.len());
                None
            }
            None => None,
        }
    }

    fn licensing_service_key(&self) -> Option<String> {
        let rows = match self.inventory.query(LICENSING_QUERY) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Licensing service query failed: {e}");
                return None;
            }
        };

        let key = rows
            .into_iter()
            .find_map(|mut row| row.remove("OA3xOriginalProductKey"))?;
        if !is_well_formed_key(&key) {
            log::warn!("Licensing service returned an unusual key format: {key}");
        }
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OfficeCatalog;
    use crate::inventory::MemoryInventory;
    use crate::network::AdapterInfo;
    use crate::registry::{MemoryRegistry, RegistryValue};

    const OEM_KEY: &str = "VK7JG-NPHTM-C97JM-9MPGT-3V66T";

    fn lookup(registry: &MemoryRegistry, inventory: &MemoryInventory) -> String {
        let adapters: Vec<AdapterInfo> = Vec::new();
        let catalog = OfficeCatalog::default();
        SystemProbe::new(registry, inventory, &adapters, &catalog).windows_product_key()
    }

    fn oem_inventory() -> MemoryInventory {
        MemoryInventory::new().with_row(
            "SoftwareLicensingService",
            &[("OA3xOriginalProductKey", OEM_KEY)],
        )
    }

    #[test]
    fn decodes_registry_value_first() {
        let mut digital_product_id = vec![0u8; 164];
        digital_product_id[0] = 1;
        let registry = MemoryRegistry::new().with_value(
            CURRENT_VERSION_KEY,
            "DigitalProductId",
            RegistryValue::Binary(digital_product_id),
        );

        assert_eq!(
            lookup(&registry, &oem_inventory()),
            "BBBBB-BBBBB-BBBBB-BBBBB-BBBBC"
        );
    }

    #[test]
    fn short_registry_value_falls_back_to_licensing_service() {
        let registry = MemoryRegistry::new().with_value(
            CURRENT_VERSION_KEY,
            "DigitalProductId",
            RegistryValue::Binary(vec![1, 2, 3]),
        );
        assert_eq!(lookup(&registry, &oem_inventory()), OEM_KEY);
    }

    #[test]
    fn text_registry_value_falls_back_to_licensing_service() {
        let registry = MemoryRegistry::new().with_value(
            CURRENT_VERSION_KEY,
            "DigitalProductId",
            RegistryValue::String("not binary".into()),
        );
        assert_eq!(lookup(&registry, &oem_inventory()), OEM_KEY);
    }

    #[test]
    fn missing_everywhere_yields_sentinel() {
        let inventory = MemoryInventory::new()
            .with_row("SoftwareLicensingService", &[("OA3xOriginalProductKey", "")]);
        assert_eq!(lookup(&MemoryRegistry::new(), &inventory), KEY_NOT_FOUND);
        assert_eq!(
            lookup(&MemoryRegistry::new(), &MemoryInventory::new()),
            KEY_NOT_FOUND
        );
    }
}
