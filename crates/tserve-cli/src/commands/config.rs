//! Configuration inspection commands

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use tserve_config::ConfigManager;

pub fn show(manager: &ConfigManager, json: bool) -> Result<ExitCode> {
    let configuration = manager.configuration();

    if json {
        let map: serde_json::Map<String, serde_json::Value> = configuration
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Resolved Configuration");
    println!("======================\n");
    match manager.properties_file() {
        Some(path) => println!("Properties file: {}", path.display()),
        None => println!("Properties file: none (defaults only)"),
    }
    println!(
        "Environment overrides: {}",
        if manager.env_applied() { "applied" } else { "disabled" }
    );
    if let Some(path) = manager.snapshot_path() {
        println!("Snapshot: {}", path.display());
    }
    println!();
    print!("{}", configuration.to_properties(None));

    Ok(ExitCode::SUCCESS)
}

pub fn snapshot(manager: &ConfigManager, dir: Option<&Path>) -> Result<ExitCode> {
    let path = manager.save_snapshot(dir)?;
    println!("Snapshot written: {}", path.display());
    Ok(ExitCode::SUCCESS)
}
