use crate::probe::{SystemProbe, OS_UNDETERMINED};

/// Registry key holding the OS identification values.
pub const CURRENT_VERSION_KEY: &str = r"SOFTWARE\Microsoft\Windows NT\CurrentVersion";

const OS_QUERY: &str = "SELECT Caption, Version FROM Win32_OperatingSystem";

/// Windows 11 still reports itself as Windows 10 in `ProductName`; only the
/// build number tells them apart.
const WINDOWS_11_FIRST_BUILD: u32 = 22000;

/// OS identification read from the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsFacts {
    pub product_name: String,
    pub display_version: Option<String>,
    pub build: String,
    pub ubr: Option<u32>,
}

impl OsFacts {
    /// `<name> (<display version>) [Build <build>.<ubr>]`, with the display
    /// version and UBR left out when absent or zero.
    pub fn summary(&self) -> String {
        let name = match self.build.trim().parse::<u32>() {
            Ok(build) => relabel_for_build(&self.product_name, build),
            Err(_) => self.product_name.clone(),
        };

        let mut line = name;
        if let Some(display_version) = self.display_version.as_deref().filter(|v| !v.is_empty()) {
            line.push_str(&format!(" ({display_version})"));
        }
        line.push_str(&format!(" [Build {}", self.build));
        if let Some(ubr) = self.ubr.filter(|&ubr| ubr > 0) {
            line.push_str(&format!(".{ubr}"));
        }
        line.push(']');
        line
    }
}

/// Rename "Windows 10" to "Windows 11" for builds 22000 and later.
pub fn relabel_for_build(product_name: &str, build: u32) -> String {
    if product_name.contains("Windows 10") && build >= WINDOWS_11_FIRST_BUILD {
        product_name.replace("Windows 10", "Windows 11")
    } else {
        product_name.to_string()
    }
}

/// Same as [`relabel_for_build`] for a `10.0.<build>` version string.
///
/// Compares the parsed build number rather than a `10.0.22` prefix, so later
/// Windows 11 builds such as `10.0.26100` are relabelled too.
pub fn relabel_for_version(caption: &str, version: &str) -> String {
    let build = version
        .strip_prefix("10.0.")
        .and_then(|rest| rest.split('.').next())
        .and_then(|build| build.parse::<u32>().ok());

    match build {
        Some(build) => relabel_for_build(caption, build),
        None => caption.to_string(),
    }
}

impl SystemProbe<'_> {
    /// Read OS identification from the registry.
    ///
    /// Returns `None` when the key is missing or lacks a product name or build.
    pub fn os_facts(&self) -> Option<OsFacts> {
        let product_name = self
            .registry
            .text(CURRENT_VERSION_KEY, "ProductName")
            .filter(|name| !name.trim().is_empty())?;
        let build = self
            .registry
            .text(CURRENT_VERSION_KEY, "CurrentBuild")
            .filter(|build| !build.trim().is_empty())?;

        let ubr = match self.registry.value(CURRENT_VERSION_KEY, "UBR") {
            Ok(value) => value.and_then(|v| v.as_u32()),
            Err(e) => {
                log::debug!("Reading UBR failed: {e}");
                None
            }
        };

        Some(OsFacts {
            product_name,
            display_version: self.registry.text(CURRENT_VERSION_KEY, "DisplayVersion"),
            build,
            ubr,
        })
    }

    /// Human-readable OS version line.
    ///
    /// Tries the registry first, then `Win32_OperatingSystem`, and returns
    /// [`OS_UNDETERMINED`] if both fail.
    pub fn os_version(&self) -> String {
        if let Some(facts) = self.os_facts() {
            return facts.summary();
        }
        log::debug!("OS facts incomplete in registry, querying Win32_OperatingSystem");

        match self.inventory.query(OS_QUERY) {
            Ok(rows) => {
                let found = rows.iter().find_map(|row| {
                    let caption = row.get("Caption")?;
                    let version = row.get("Version")?;
                    Some(format!(
                        "{} (Build {version})",
                        relabel_for_version(caption, version)
                    ))
                });
                if let Some(line) = found {
                    return line;
                }
            }
            Err(e) => log::warn!("OS query failed: {e}"),
        }

        OS_UNDETERMINED.to_string()
    }
}
