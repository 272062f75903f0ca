//! keyscope - collects the license state of a Windows machine into a text report
//!
//! The report covers:
//!
//! - OS edition and build (`HKLM\SOFTWARE\Microsoft\Windows NT\CurrentVersion`,
//!   falling back to `Win32_OperatingSystem`)
//! - the Windows product key, decoded from `DigitalProductId` or taken from the
//!   licensing service
//! - the installed Office release, license type and key
//! - the MAC address of the primary physical network adapter
//!
//! # Example
//!
//! ```rust,ignore
//! use keyscope::config::OfficeCatalog;
//! use keyscope::platform::system_sources;
//! use keyscope::probe::SystemProbe;
//! use keyscope::report::collect_report;
//!
//! let sources = system_sources();
//! let catalog = OfficeCatalog::default();
//! let probe = SystemProbe::new(
//!     sources.registry.as_ref(),
//!     sources.inventory.as_ref(),
//!     sources.adapters.as_ref(),
//!     &catalog,
//! );
//! let report = collect_report(&probe, "DESKTOP-01", chrono::Local::now());
//! println!("{}", report.render());
//! ```

pub mod config;
pub mod errors;
pub mod inventory;
pub mod network;
pub mod platform;
pub mod probe;
pub mod product_key;
pub mod registry;
pub mod report;
