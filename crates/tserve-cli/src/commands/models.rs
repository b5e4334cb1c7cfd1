//! Per-model override lookups

use std::process::ExitCode;

use anyhow::Result;
use tserve_config::ConfigManager;

pub fn value(
    manager: &ConfigManager,
    model: &str,
    version: &str,
    setting: &str,
    default: i64,
) -> Result<ExitCode> {
    let overrides = manager.model_overrides();
    if let Some(error) = overrides.parse_error() {
        eprintln!("warning: model overrides ignored: {error}");
    }

    println!("{}", manager.get_json_int_value(model, version, setting, default));
    Ok(ExitCode::SUCCESS)
}
