//! Read-only access to a registry-like key/value store.
//!
//! Paths are relative to `HKEY_LOCAL_MACHINE` and use backslashes, e.g.
//! `SOFTWARE\Microsoft\Windows NT\CurrentVersion`. Lookups are
//! case-insensitive, matching the Windows registry.

use std::collections::BTreeMap;

use crate::errors::InventoryResult;

/// A typed registry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    String(String),
    Dword(u32),
    Binary(Vec<u8>),
}

impl RegistryValue {
    /// Text form of the value. DWORDs are rendered in decimal; binary values
    /// have no text form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RegistryValue::String(s) => Some(s.clone()),
            RegistryValue::Dword(n) => Some(n.to_string()),
            RegistryValue::Binary(_) => None,
        }
    }

    /// Numeric form of the value. Strings are parsed after trimming.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            RegistryValue::Dword(n) => Some(*n),
            RegistryValue::String(s) => s.trim().parse().ok(),
            RegistryValue::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RegistryValue::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Source of registry keys and values.
pub trait RegistryStore {
    /// Read value `name` under `path`.
    ///
    /// Returns `Ok(None)` when either the key or the value does not exist.
    fn value(&self, path: &str, name: &str) -> InventoryResult<Option<RegistryValue>>;

    /// Names of the immediate subkeys of `path`, or `Ok(None)` if the key does
    /// not exist.
    fn subkeys(&self, path: &str) -> InventoryResult<Option<Vec<String>>>;

    /// Read a value and convert it to text, treating read errors as absent.
    fn text(&self, path: &str, name: &str) -> Option<String> {
        match self.value(path, name) {
            Ok(value) => value.and_then(|v| v.as_text()),
            Err(e) => {
                log::debug!("Reading {path}\\{name} failed: {e}");
                None
            }
        }
    }
}

/// Registry kept in memory.
///
/// Used as the registry on platforms without one, and to stage registry
/// contents in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    // Keyed by lowercased path; each entry keeps the original-case path and its values.
    keys: BTreeMap<String, MemoryKey>,
}

#[derive(Debug, Clone, Default)]
struct MemoryKey {
    path: String,
    values: BTreeMap<String, RegistryValue>,
}

fn normalize(path: &str) -> String {
    path.trim_matches('\\').to_lowercase()
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` (and its parents) with no values.
    pub fn with_key(mut self, path: &str) -> Self {
        self.ensure_key(path);
        self
    }

    /// Create `path` if needed and set `name` to `value` under it.
    pub fn with_value(mut self, path: &str, name: &str, value: RegistryValue) -> Self {
        self.ensure_key(path)
            .values
            .insert(name.to_lowercase(), value);
        self
    }

    fn ensure_key(&mut self, path: &str) -> &mut MemoryKey {
        let trimmed = path.trim_matches('\\');
        let mut prefix = String::new();
        for segment in trimmed.split('\\') {
            if !prefix.is_empty() {
                prefix.push('\\');
            }
            prefix.push_str(segment);
            self.keys
                .entry(prefix.to_lowercase())
                .or_insert_with(|| MemoryKey {
                    path: prefix.clone(),
                    values: BTreeMap::new(),
                });
        }
        self.keys
            .entry(normalize(trimmed))
            .or_default()
    }
}

impl RegistryStore for MemoryRegistry {
    fn value(&self, path: &str, name: &str) -> InventoryResult<Option<RegistryValue>> {
        Ok(self
            .keys
            .get(&normalize(path))
            .and_then(|key| key.values.get(&name.to_lowercase()))
            .cloned())
    }

    fn subkeys(&self, path: &str) -> InventoryResult<Option<Vec<String>>> {
        let parent = normalize(path);
        if !self.keys.contains_key(&parent) {
            return Ok(None);
        }

        let prefix = format!("{parent}\\");
        let children = self
            .keys
            .iter()
            .filter_map(|(lowered, key)| {
                let rest = lowered.strip_prefix(&prefix)?;
                if rest.contains('\\') {
                    return None;
                }
                key.path.rsplit('\\').next().map(str::to_string)
            })
            .collect();

        Ok(Some(children))
    }
}
