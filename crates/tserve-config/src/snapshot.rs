//! Configuration snapshots
//!
//! Each startup with snapshots enabled writes the resolved configuration to
//! `<log_location>/config/<timestamp>-startup.cfg`. The newest snapshot is
//! read back as the properties layer on the next start.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;
use tserve_core::{Result, TsError};

use crate::resolver::ResolvedConfiguration;

const SNAPSHOT_SUFFIX: &str = "-startup.cfg";

pub fn snapshot_dir(log_location: &Path) -> PathBuf {
    log_location.join("config")
}

/// Write a snapshot and return its path
pub fn save(dir: &Path, config: &ResolvedConfiguration) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut stamp = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
    let mut path = dir.join(format!("{stamp}{SNAPSHOT_SUFFIX}"));
    // Two saves inside the same millisecond must not clobber each other.
    let mut counter = 0u32;
    while path.exists() {
        counter += 1;
        stamp = format!("{}{counter:03}", Utc::now().format("%Y%m%d%H%M%S%3f"));
        path = dir.join(format!("{stamp}{SNAPSHOT_SUFFIX}"));
    }

    let header = format!("tserve configuration snapshot\nsaved {}", Utc::now().to_rfc3339());
    std::fs::write(&path, config.to_properties(Some(&header))).map_err(|e| {
        TsError::config(format!("unable to write snapshot {}: {e}", path.display()))
    })?;
    info!("Configuration snapshot written to {:?}", path);
    Ok(path)
}

/// Newest snapshot in `dir`, if any
pub fn latest(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(SNAPSHOT_SUFFIX))
        })
        .max()
}
