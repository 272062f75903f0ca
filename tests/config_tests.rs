use std::env;
use std::fs;

use serial_test::serial;

use chrono::Local;

use keyscope::config::{load_or_default, KeyscopeConfig};
use keyscope::platform::empty_sources;
use keyscope::probe::SystemProbe;
use keyscope::report::collect_report;

const ENV_VARS: [&str; 5] = [
    "KEYSCOPE_CONFIG",
    "KEYSCOPE_OUTPUT_DIR",
    "KEYSCOPE_FILE_PREFIX",
    "KEYSCOPE_LOGGING_ENABLED",
    "KEYSCOPE_LOG_LEVEL",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn load_uses_defaults_without_file_or_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    env::set_var("KEYSCOPE_CONFIG", dir.path().join("absent"));

    let config = KeyscopeConfig::load().unwrap();
    assert_eq!(config.output.directory, ".");
    assert_eq!(config.output.file_prefix, "Office_System_Info");
    assert!(!config.logging.enabled);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.office.releases.len(), 7);
    assert!(config.validate().is_ok());

    clear_env();
}

#[test]
#[serial]
fn environment_overrides_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    env::set_var("KEYSCOPE_CONFIG", dir.path().join("absent"));
    env::set_var("KEYSCOPE_OUTPUT_DIR", "C:\\Reports");
    env::set_var("KEYSCOPE_FILE_PREFIX", "system_info");
    env::set_var("KEYSCOPE_LOGGING_ENABLED", "true");
    env::set_var("KEYSCOPE_LOG_LEVEL", "debug");

    let config = KeyscopeConfig::load().unwrap();
    assert_eq!(config.output.directory, "C:\\Reports");
    assert_eq!(config.output.file_prefix, "system_info");
    assert!(config.logging.enabled);
    assert_eq!(config.logging.level, "debug");

    clear_env();
}

#[test]
#[serial]
fn file_can_extend_office_tables() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("keyscope.toml");
    fs::write(
        &file,
        r#"
[output]
file_prefix = "inventory"

[office]
excluded_products = ["Proofing", "Language", "Runtime"]
"#,
    )
    .unwrap();
    env::set_var("KEYSCOPE_CONFIG", &file);

    let config = KeyscopeConfig::load().unwrap();
    assert_eq!(config.output.file_prefix, "inventory");
    assert_eq!(config.output.directory, ".");
    assert_eq!(
        config.office.excluded_products,
        vec!["Proofing", "Language", "Runtime"]
    );
    // Tables not mentioned keep their defaults.
    assert_eq!(config.office.click_to_run_token, "O365");
    assert!(config.office.allowed_products.contains(&"Visio".to_string()));

    clear_env();
}

#[test]
#[serial]
fn invalid_log_level_fails_validation() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    env::set_var("KEYSCOPE_CONFIG", dir.path().join("absent"));
    env::set_var("KEYSCOPE_LOG_LEVEL", "chatty");

    let config = KeyscopeConfig::load().unwrap();
    assert!(config.validate().is_err());

    clear_env();
}

#[test]
#[serial]
fn invalid_log_level_falls_back_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    env::set_var("KEYSCOPE_CONFIG", dir.path().join("absent"));
    env::set_var("KEYSCOPE_FILE_PREFIX", "custom");
    env::set_var("KEYSCOPE_LOG_LEVEL", "verbose");

    let config = load_or_default();
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.output.file_prefix, "Office_System_Info");
    assert!(config.validate().is_ok());

    clear_env();
}

#[test]
#[serial]
fn valid_environment_is_kept_by_load_or_default() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    env::set_var("KEYSCOPE_CONFIG", dir.path().join("absent"));
    env::set_var("KEYSCOPE_LOGGING_ENABLED", "true");
    env::set_var("KEYSCOPE_LOG_LEVEL", "warn");

    let config = load_or_default();
    assert!(config.logging.enabled);
    assert_eq!(config.logging.level, "warn");

    clear_env();
}

#[test]
#[serial]
fn invalid_log_level_still_produces_a_report() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    env::set_var("KEYSCOPE_CONFIG", dir.path().join("absent"));
    env::set_var("KEYSCOPE_LOG_LEVEL", "verbose");

    let config = load_or_default();
    let sources = empty_sources();
    let probe = SystemProbe::new(
        sources.registry.as_ref(),
        sources.inventory.as_ref(),
        sources.adapters.as_ref(),
        &config.office,
    )
    .with_directory_check(|_| false);

    let report = collect_report(&probe, "BAD-CONFIG-PC", Local::now());
    let path = report
        .write_to(dir.path(), &config.output.file_prefix)
        .unwrap();

    assert!(path.exists());
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("Computer name: BAD-CONFIG-PC"));

    clear_env();
}
