use std::path::Path;

use keyscope::config::{get_config, KeyscopeConfig};
use keyscope::errors::InventoryResult;
use keyscope::platform::{host_name, system_sources};
use keyscope::probe::SystemProbe;
use keyscope::report::collect_report;

/// Start `env_logger` at the configured level. `RUST_LOG` still takes precedence.
fn init_logging(config: &KeyscopeConfig) {
    if !config.logging.enabled {
        return;
    }
    let env = env_logger::Env::default().default_filter_or(config.logging.level.to_lowercase());
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn run() -> InventoryResult<()> {
    let config = get_config();
    init_logging(config);

    let sources = system_sources();
    let probe = SystemProbe::new(
        sources.registry.as_ref(),
        sources.inventory.as_ref(),
        sources.adapters.as_ref(),
        &config.office,
    );

    let host = host_name();
    let report = collect_report(&probe, &host, chrono::Local::now());
    let path = report.write_to(Path::new(&config.output.directory), &config.output.file_prefix)?;

    println!("Information saved to file: {}", path.display());
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        println!("Error: {e}");
    }
}
