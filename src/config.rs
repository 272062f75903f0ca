//! Configuration system for keyscope.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `keyscope.toml` file (or the file named by `KEYSCOPE_CONFIG`)
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `KEYSCOPE_CONFIG` - Path of the configuration file (without extension is fine)
//! - `KEYSCOPE_OUTPUT_DIR` - Directory the report is written to
//! - `KEYSCOPE_FILE_PREFIX` - Report file name prefix
//! - `KEYSCOPE_LOGGING_ENABLED` - Enable logging to stderr
//! - `KEYSCOPE_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
//!
//! The Office lookup tables (`[office]` section) can only be changed from the
//! configuration file.

use config::Config;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;

use crate::errors::{InventoryError, InventoryResult};

/// Global configuration singleton.
static CONFIG: OnceLock<KeyscopeConfig> = OnceLock::new();

/// Default configuration file name, resolved relative to the working directory.
const DEFAULT_CONFIG_FILE: &str = "keyscope";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyscopeConfig {
    /// Report output configuration
    pub output: OutputConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Office detection tables
    pub office: OfficeCatalog,
}

/// Report output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the report file is written to
    pub directory: String,
    /// File name prefix; the host name and `.txt` are appended
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            file_prefix: "Office_System_Info".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

/// An Office registry version id and its marketing name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OfficeRelease {
    /// Registry version id, e.g. `16.0`
    pub id: String,
    /// Release name, e.g. `2021/2019/365`
    pub name: String,
}

impl OfficeRelease {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Lookup tables driving Office detection.
///
/// Passed by reference into the Office probe; nothing here changes at runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OfficeCatalog {
    /// Known releases, newest first. Scanned in this order.
    pub releases: Vec<OfficeRelease>,
    /// A product name must contain at least one of these.
    pub allowed_products: Vec<String>,
    /// A product name must contain none of these.
    pub excluded_products: Vec<String>,
    /// A non-empty `ProductId` must start with this prefix...
    pub product_id_prefix: String,
    /// ...or contain one of these.
    pub product_id_markers: Vec<String>,
    /// Registry keys whose having subkeys suggests Office may be installed.
    pub presence_registry_keys: Vec<String>,
    /// Directories whose having content suggests Office may be installed.
    pub presence_directories: Vec<String>,
    /// Registration key templates; `{version}` is replaced with a release id.
    pub registration_roots: Vec<String>,
    /// Click-to-Run configuration key.
    pub click_to_run_key: String,
    /// Token in `ProductReleaseIds` identifying a Microsoft 365 install.
    pub click_to_run_token: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for OfficeCatalog {
    fn default() -> Self {
        Self {
            releases: vec![
                OfficeRelease::new("16.0", "2021/2019/365"),
                OfficeRelease::new("15.0", "2013"),
                OfficeRelease::new("14.0", "2010"),
                OfficeRelease::new("12.0", "2007"),
                OfficeRelease::new("11.0", "2003"),
                OfficeRelease::new("10.0", "2002"),
                OfficeRelease::new("9.0", "2000"),
            ],
            allowed_products: owned(&[
                "Office",
                "Word",
                "Excel",
                "PowerPoint",
                "Outlook",
                "Access",
                "Publisher",
                "OneNote",
                "Visio",
                "Project",
            ]),
            excluded_products: owned(&[
                "Proofing",
                "Proof",
                "Compatibility",
                "Converter",
                "Component",
                "Language",
                "Language Pack",
                "Help",
            ]),
            product_id_prefix: "Office".to_string(),
            product_id_markers: owned(&["Standard", "Professional", "Home"]),
            presence_registry_keys: owned(&[
                r"SOFTWARE\Microsoft\Office",
                r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
            ]),
            presence_directories: owned(&[
                r"C:\Program Files\Microsoft Office",
                r"C:\Program Files (x86)\Microsoft Office",
            ]),
            registration_roots: owned(&[
                r"SOFTWARE\Microsoft\Office\{version}\Registration",
                r"SOFTWARE\WOW6432Node\Microsoft\Office\{version}\Registration",
            ]),
            click_to_run_key: r"SOFTWARE\Microsoft\Office\ClickToRun\Configuration".to_string(),
            click_to_run_token: "O365".to_string(),
        }
    }
}

impl OfficeCatalog {
    /// Release name for a registry version id, or the id itself if unknown.
    pub fn release_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.releases
            .iter()
            .find(|release| release.id == id)
            .map(|release| release.name.as_str())
            .unwrap_or(id)
    }

    /// Registration key paths to scan for release `id`.
    pub fn registration_paths(&self, id: &str) -> Vec<String> {
        self.registration_roots
            .iter()
            .map(|root| root.replace("{version}", id))
            .collect()
    }
}

impl KeyscopeConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `keyscope.toml` file (optional)
    /// 3. Environment variables
    pub fn load() -> InventoryResult<Self> {
        let config_file =
            env::var("KEYSCOPE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let builder = Config::builder()
            // Start with defaults
            .set_default("output.directory", ".")
            .map_err(|e| InventoryError::ConfigError(e.to_string()))?
            .set_default("output.file_prefix", "Office_System_Info")
            .map_err(|e| InventoryError::ConfigError(e.to_string()))?
            .set_default("logging.enabled", false)
            .map_err(|e| InventoryError::ConfigError(e.to_string()))?
            .set_default("logging.level", "info")
            .map_err(|e| InventoryError::ConfigError(e.to_string()))?
            // Load from keyscope.toml (optional)
            .add_source(config::File::with_name(&config_file).required(false))
            // Override with environment variables
            .set_override_option("output.directory", env::var("KEYSCOPE_OUTPUT_DIR").ok())
            .map_err(|e| InventoryError::ConfigError(e.to_string()))?
            .set_override_option("output.file_prefix", env::var("KEYSCOPE_FILE_PREFIX").ok())
            .map_err(|e| InventoryError::ConfigError(e.to_string()))?
            .set_override_option(
                "logging.enabled",
                env::var("KEYSCOPE_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(|e| InventoryError::ConfigError(e.to_string()))?
            .set_override_option("logging.level", env::var("KEYSCOPE_LOG_LEVEL").ok())
            .map_err(|e| InventoryError::ConfigError(e.to_string()))?;

        let settings = builder
            .build()
            .map_err(|e| InventoryError::ConfigError(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| InventoryError::ConfigError(format!("failed to deserialize config: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> InventoryResult<()> {
        if self.output.file_prefix.trim().is_empty() {
            return Err(InventoryError::ConfigError(
                "output.file_prefix cannot be empty".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(InventoryError::ConfigError(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        if self.office.releases.is_empty() {
            return Err(InventoryError::ConfigError(
                "office.releases cannot be empty".to_string(),
            ));
        }
        if self.office.allowed_products.is_empty() {
            return Err(InventoryError::ConfigError(
                "office.allowed_products cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load and validate the configuration, falling back to defaults.
///
/// On any load or validation error the error is printed and
/// [`KeyscopeConfig::default()`] is returned.
pub fn load_or_default() -> KeyscopeConfig {
    match KeyscopeConfig::load().and_then(|config| config.validate().map(|()| config)) {
        Ok(config) => config,
        Err(e) => {
            // The logger is not running yet, it depends on this configuration.
            eprintln!("Warning: {e}; using default configuration");
            KeyscopeConfig::default()
        }
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
pub fn get_config() -> &'static KeyscopeConfig {
    CONFIG.get_or_init(load_or_default)
}
