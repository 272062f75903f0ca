use std::io::ErrorKind;

use winreg::enums::{RegType, HKEY_LOCAL_MACHINE};
use winreg::types::FromRegValue;
use winreg::RegKey;

use crate::errors::{InventoryError, InventoryResult};
use crate::inventory::WmicQuery;
use crate::network::WmiAdapterSource;
use crate::platform::SystemSources;
use crate::registry::{RegistryStore, RegistryValue};

pub fn sources() -> SystemSources {
    SystemSources {
        registry: Box::new(WindowsRegistry::new()),
        inventory: Box::new(WmicQuery::new()),
        adapters: Box::new(WmiAdapterSource::new(WmicQuery::new())),
    }
}

/// `HKEY_LOCAL_MACHINE` through `winreg`.
pub struct WindowsRegistry {
    root: RegKey,
}

impl WindowsRegistry {
    pub fn new() -> Self {
        Self {
            root: RegKey::predef(HKEY_LOCAL_MACHINE),
        }
    }

    fn open(&self, path: &str) -> InventoryResult<Option<RegKey>> {
        match self.root.open_subkey(path) {
            Ok(key) => Ok(Some(key)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(InventoryError::Registry(format!("open {path}: {e}"))),
        }
    }
}

impl RegistryStore for WindowsRegistry {
    fn value(&self, path: &str, name: &str) -> InventoryResult<Option<RegistryValue>> {
        let Some(key) = self.open(path)? else {
            return Ok(None);
        };

        let raw = match key.get_raw_value(name) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(InventoryError::Registry(format!("read {path}\\{name}: {e}")));
            }
        };

        let value = match raw.vtype {
            RegType::REG_SZ | RegType::REG_EXPAND_SZ => String::from_reg_value(&raw)
                .map(RegistryValue::String)
                .map_err(|e| InventoryError::Registry(format!("decode {path}\\{name}: {e}")))?,
            RegType::REG_DWORD => u32::from_reg_value(&raw)
                .map(RegistryValue::Dword)
                .map_err(|e| InventoryError::Registry(format!("decode {path}\\{name}: {e}")))?,
            _ => RegistryValue::Binary(raw.bytes.to_vec()),
        };

        Ok(Some(value))
    }

    fn subkeys(&self, path: &str) -> InventoryResult<Option<Vec<String>>> {
        let Some(key) = self.open(path)? else {
            return Ok(None);
        };

        let names = key
            .enum_keys()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| InventoryError::Registry(format!("enumerate {path}: {e}")))?;
        Ok(Some(names))
    }
}
