//! Startup arguments consumed by configuration init

use std::path::PathBuf;

use crate::keys;

/// Arguments handed to `ConfigManager::init`, highest-precedence layer
#[derive(Debug, Clone, Default)]
pub struct StartupArgs {
    /// Models to load at startup (`load_models`)
    pub models: Vec<String>,
    pub model_store: Option<PathBuf>,
    /// Explicit properties file; a missing file is fatal
    pub ts_config_file: Option<PathBuf>,
    /// Skip reading and writing configuration snapshots
    pub snapshot_disabled: bool,
    pub log_location: Option<PathBuf>,
    /// Raw `key=value` overrides applied last
    pub properties: Vec<(String, String)>,
}

impl StartupArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ts_config_file = Some(path.into());
        self
    }

    pub fn with_snapshot_disabled(mut self, disabled: bool) -> Self {
        self.snapshot_disabled = disabled;
        self
    }

    pub fn with_log_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_location = Some(path.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    /// The argument layer as property entries, in application order
    pub fn to_entries(&self) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        if !self.models.is_empty() {
            entries.push((keys::LOAD_MODELS.to_string(), self.models.join(",")));
        }
        if let Some(store) = &self.model_store {
            entries.push((keys::MODEL_STORE.to_string(), store.display().to_string()));
        }
        if let Some(location) = &self.log_location {
            entries.push((keys::LOG_LOCATION.to_string(), location.display().to_string()));
        }
        entries.extend(self.properties.iter().cloned());
        entries
    }
}

/// Parse a `key=value` pair as given on the command line
pub fn parse_property(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty property key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
