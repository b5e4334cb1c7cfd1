//! Layered property resolution
//!
//! Layers, lowest to highest precedence:
//! 1. compiled-in defaults ([`keys::DEFAULTS`])
//! 2. the properties file (explicit, snapshot, or a well-known location)
//! 3. `TS_*` environment variables, only when `enable_envvars_config` is true
//! 4. startup arguments
//!
//! A key present in a higher layer always wins, including when its value is
//! empty.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use config::{builder::DefaultState, ConfigBuilder, ConfigError, Map, Source, Value};
use tracing::{debug, info};
use tserve_core::{Result, TsError};

use crate::args::StartupArgs;
use crate::{env, keys, properties, snapshot};

/// Canonical properties file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.properties";

/// The merged, immutable key/value map produced by one resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfiguration {
    entries: BTreeMap<String, String>,
}

impl ResolvedConfiguration {
    pub fn from_entries(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Resolved value, or `fallback` when the key is absent
    pub fn get_property<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.get(key).unwrap_or(fallback)
    }

    pub fn get_int(&self, key: &str, fallback: i64) -> i64 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(fallback)
    }

    pub fn get_bool(&self, key: &str, fallback: bool) -> bool {
        match self.get(key).map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("true") => true,
            Some(v) if v.eq_ignore_ascii_case("false") => false,
            _ => fallback,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render in properties-file format
    pub fn to_properties(&self, header: Option<&str>) -> String {
        properties::to_string(&self.entries, header)
    }
}

impl FromIterator<(String, String)> for ResolvedConfiguration {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Outcome of one resolution pass
#[derive(Debug, Clone)]
pub struct Resolution {
    pub configuration: ResolvedConfiguration,
    /// File used as the properties layer, if any
    pub properties_file: Option<PathBuf>,
    /// Whether the environment layer was consulted
    pub env_applied: bool,
}

/// One configuration layer fed to the `config` builder
#[derive(Debug, Clone)]
struct Layer {
    origin: String,
    entries: BTreeMap<String, String>,
}

impl Layer {
    fn new<I>(origin: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            origin: origin.into(),
            entries: entries.into_iter().collect(),
        }
    }
}

impl Source for Layer {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> std::result::Result<Map<String, Value>, ConfigError> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (encode_key(k), Value::new(Some(&self.origin), v.clone())))
            .collect())
    }
}

/// Builds a [`ResolvedConfiguration`] from startup arguments and the environment
#[derive(Debug, Clone)]
pub struct PropertyResolver {
    args: StartupArgs,
    env_vars: Vec<(String, String)>,
    search_dirs: Vec<PathBuf>,
}

impl PropertyResolver {
    /// Resolver reading the real process environment
    pub fn new(args: StartupArgs) -> Self {
        let mut search_dirs = vec![PathBuf::from(".")];
        if let Some(dir) = dirs::config_dir() {
            search_dirs.push(dir.join("tserve"));
        }
        Self {
            args,
            env_vars: env::process_vars(),
            search_dirs,
        }
    }

    /// Replace the environment snapshot
    pub fn with_env<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env_vars = vars.into_iter().collect();
        self
    }

    /// Replace the directories searched for `config.properties`
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    pub fn args(&self) -> &StartupArgs {
        &self.args
    }

    /// Directory holding configuration snapshots
    pub fn snapshot_dir(&self) -> PathBuf {
        let log_location = self
            .args
            .log_location
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_of(keys::LOG_LOCATION)));
        snapshot::snapshot_dir(&log_location)
    }

    /// Pick the properties file. Returns the path and whether it was named
    /// explicitly (`TS_CONFIG_FILE`, then the argument).
    pub fn properties_file(&self) -> Option<(PathBuf, bool)> {
        if let Some((_, path)) = self
            .env_vars
            .iter()
            .find(|(name, value)| name == env::CONFIG_FILE_VAR && !value.is_empty())
        {
            return Some((PathBuf::from(path), true));
        }
        if let Some(path) = &self.args.ts_config_file {
            return Some((path.clone(), true));
        }
        if !self.args.snapshot_disabled {
            if let Some(latest) = snapshot::latest(&self.snapshot_dir()) {
                return Some((latest, false));
            }
        }
        self.search_dirs
            .iter()
            .map(|dir| dir.join(DEFAULT_CONFIG_FILE))
            .find(|path| path.is_file())
            .map(|path| (path, false))
    }

    /// Merge all layers
    pub fn resolve(&self) -> Result<Resolution> {
        let defaults = Layer::new(
            "defaults",
            keys::DEFAULTS
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        );

        let properties_file = self.properties_file();
        let file_layer = match &properties_file {
            Some((path, explicit)) => Some(load_file_layer(path, *explicit)?),
            None => {
                info!("No properties file found, using defaults");
                None
            }
        };

        let arguments = Layer::new("arguments", self.args.to_entries());

        // The env gate is read from every layer except the environment itself.
        let gate = ResolvedConfiguration::from_entries(build(
            &defaults,
            file_layer.as_ref(),
            None,
            &arguments,
        )?);
        let env_applied = gate.get_bool(keys::ENABLE_ENVVARS_CONFIG, false);

        // Only recognized keys, or keys a lower layer already set, are taken
        // from the environment.
        let env_layer = env_applied.then(|| {
            let known = |key: &str| keys::is_recognized(key) || gate.contains_key(key);
            let entries = env::collect(self.env_vars.iter().cloned(), known);
            debug!("Applying {} environment override(s)", entries.len());
            Layer::new("environment", entries)
        });

        let entries = build(&defaults, file_layer.as_ref(), env_layer.as_ref(), &arguments)?;
        Ok(Resolution {
            configuration: ResolvedConfiguration::from_entries(entries),
            properties_file: properties_file.map(|(path, _)| path),
            env_applied,
        })
    }
}

fn default_of(key: &str) -> &'static str {
    keys::DEFAULTS
        .iter()
        .find(|(k, _)| *k == key)
        .map_or("", |(_, v)| *v)
}

fn load_file_layer(path: &Path, explicit: bool) -> Result<Layer> {
    match properties::load(path) {
        Ok(entries) => {
            info!("Loading properties from: {:?}", path);
            Ok(Layer::new(path.display().to_string(), entries))
        }
        Err(e) if explicit => Err(e),
        Err(e) => {
            info!("Skipping properties file {:?}: {}", path, e);
            Ok(Layer::new(path.display().to_string(), BTreeMap::new()))
        }
    }
}

fn build(
    defaults: &Layer,
    file: Option<&Layer>,
    environment: Option<&Layer>,
    arguments: &Layer,
) -> Result<BTreeMap<String, String>> {
    let mut builder = ConfigBuilder::<DefaultState>::default().add_source(defaults.clone());
    if let Some(file) = file {
        builder = builder.add_source(file.clone());
    }
    if let Some(environment) = environment {
        builder = builder.add_source(environment.clone());
    }
    builder = builder.add_source(arguments.clone());

    let merged = builder
        .build()
        .map_err(|e| TsError::config(format!("failed to merge configuration layers: {e}")))?;
    let root = merged
        .collect()
        .map_err(|e| TsError::config(format!("failed to read merged configuration: {e}")))?;

    root.into_iter()
        .map(|(encoded, value)| {
            let key = decode_key(&encoded)?;
            let text = value
                .into_string()
                .map_err(|e| TsError::config(format!("property `{key}`: {e}")))?;
            Ok((key, text))
        })
        .collect()
}

/// The builder treats keys as paths: it lowercases them and splits on `.`
/// and `[n]`. Property keys are opaque, so they cross it hex-encoded.
fn encode_key(key: &str) -> String {
    key.bytes().fold(String::with_capacity(key.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn decode_key(encoded: &str) -> Result<String> {
    let invalid = || TsError::config(format!("corrupt merged property key `{encoded}`"));
    if encoded.len() % 2 != 0 {
        return Err(invalid());
    }
    let bytes = (0..encoded.len())
        .step_by(2)
        .map(|i| {
            encoded
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(invalid)
        })
        .collect::<Result<Vec<u8>>>()?;
    String::from_utf8(bytes).map_err(|_| invalid())
}
