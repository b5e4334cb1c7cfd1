//! Configuration manager
//!
//! Owns one [`ResolvedConfiguration`] and everything derived from it. A
//! manager can be built and passed around explicitly (`build`), or built and
//! published as the process instance (`init`) for code that has no handle.
//!
//! `init` must run before request threads start. Calling it again replaces
//! the process instance wholesale; readers that already hold an `Arc` keep
//! the previous manager. Re-initialization is not coordinated with readers
//! calling `instance()` at the same time.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use once_cell::sync::OnceCell;
use tracing::{info, warn};
use tserve_core::{Metric, Result, TsError};

use crate::allowlist::UrlAllowlist;
use crate::args::StartupArgs;
use crate::logging::{LoggerChannel, LoggerRegistry};
use crate::overrides::{FromOverride, ModelOverrides};
use crate::resolver::{PropertyResolver, ResolvedConfiguration};
use crate::tls::{self, TlsContext};
use crate::{keys, snapshot};

static INSTANCE: ArcSwapOption<ConfigManager> = ArcSwapOption::const_empty();

#[derive(Debug)]
pub struct ConfigManager {
    configuration: ResolvedConfiguration,
    properties_file: Option<PathBuf>,
    env_applied: bool,
    snapshot_dir: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    allowlist: UrlAllowlist,
    overrides: OnceLock<ModelOverrides>,
    tls: OnceCell<TlsContext>,
    loggers: LoggerRegistry,
}

impl ConfigManager {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Resolve from the process environment and publish as the process instance
    pub fn init(args: StartupArgs) -> Result<Arc<Self>> {
        Self::init_with(PropertyResolver::new(args))
    }

    /// Like [`init`](Self::init) with a prepared resolver
    pub fn init_with(resolver: PropertyResolver) -> Result<Arc<Self>> {
        let manager = Arc::new(Self::build_with(resolver)?);
        INSTANCE.store(Some(Arc::clone(&manager)));
        Ok(manager)
    }

    /// The published process instance
    pub fn instance() -> Result<Arc<Self>> {
        INSTANCE.load_full().ok_or(TsError::Uninitialized)
    }

    /// Resolve without publishing
    pub fn build(args: StartupArgs) -> Result<Self> {
        Self::build_with(PropertyResolver::new(args))
    }

    pub fn build_with(resolver: PropertyResolver) -> Result<Self> {
        let resolution = resolver.resolve()?;
        let snapshots = !resolver.args().snapshot_disabled;

        let mut manager = Self::from_resolved(resolution.configuration)?;
        manager.properties_file = resolution.properties_file;
        manager.env_applied = resolution.env_applied;

        if snapshots {
            let dir = resolver.snapshot_dir();
            match snapshot::save(&dir, &manager.configuration) {
                Ok(path) => manager.snapshot = Some(path),
                Err(e) => warn!("Failed to write configuration snapshot: {}", e),
            }
            manager.snapshot_dir = Some(dir);
        }

        info!(
            "Configuration loaded: {} properties, environment overrides {}",
            manager.configuration.len(),
            if manager.env_applied { "enabled" } else { "disabled" }
        );
        Ok(manager)
    }

    /// Wrap an already resolved configuration. Binds the logger channels and
    /// validates configured TLS material.
    pub fn from_resolved(configuration: ResolvedConfiguration) -> Result<Self> {
        let loggers = LoggerRegistry::bind(&configuration);
        let allowlist = UrlAllowlist::parse(configuration.get(keys::ALLOWED_URLS));
        if let Some(warning) = allowlist.security_warning() {
            warn!("{}", warning);
        }

        let manager = Self {
            configuration,
            properties_file: None,
            env_applied: false,
            snapshot_dir: None,
            snapshot: None,
            allowlist,
            overrides: OnceLock::new(),
            tls: OnceCell::new(),
            loggers,
        };

        // Misconfigured certificate material aborts startup.
        if tls::is_configured(&manager.configuration) {
            manager.tls_context()?;
        }
        Ok(manager)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn configuration(&self) -> &ResolvedConfiguration {
        &self.configuration
    }

    pub fn get_property<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.configuration.get_property(key, fallback)
    }

    pub fn enable_envvars_config(&self) -> bool {
        self.configuration.get_bool(keys::ENABLE_ENVVARS_CONFIG, false)
    }

    pub fn env_applied(&self) -> bool {
        self.env_applied
    }

    pub fn log_location(&self) -> &Path {
        Path::new(self.get_property(keys::LOG_LOCATION, "logs"))
    }

    pub fn model_store(&self) -> Option<&str> {
        self.configuration
            .get(keys::MODEL_STORE)
            .filter(|v| !v.is_empty())
    }

    pub fn load_models(&self) -> Vec<&str> {
        self.get_property(keys::LOAD_MODELS, "")
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect()
    }

    /// File used as the properties layer
    pub fn properties_file(&self) -> Option<&Path> {
        self.properties_file.as_deref()
    }

    pub fn snapshot_disabled(&self) -> bool {
        self.snapshot_dir.is_none()
    }

    /// Snapshot written during this initialization
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    /// Write the resolved configuration to `dir` (or the snapshot directory)
    pub fn save_snapshot(&self, dir: Option<&Path>) -> Result<PathBuf> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => self
                .snapshot_dir
                .clone()
                .unwrap_or_else(|| snapshot::snapshot_dir(self.log_location())),
        };
        snapshot::save(&dir, &self.configuration)
    }

    // =========================================================================
    // Per-model overrides
    // =========================================================================

    /// Override table, parsed from `models` on first use
    pub fn model_overrides(&self) -> &ModelOverrides {
        self.overrides.get_or_init(|| {
            ModelOverrides::parse(self.configuration.get_property(keys::MODELS, ""))
        })
    }

    pub fn get_typed_value<T: FromOverride>(
        &self,
        model: &str,
        version: &str,
        setting: &str,
        default: T,
    ) -> T {
        self.model_overrides().get(model, version, setting, default)
    }

    pub fn get_json_int_value(&self, model: &str, version: &str, setting: &str, default: i64) -> i64 {
        self.get_typed_value(model, version, setting, default)
    }

    // =========================================================================
    // Allowed URLs
    // =========================================================================

    pub fn url_allowlist(&self) -> &UrlAllowlist {
        &self.allowlist
    }

    pub fn allowed_urls(&self) -> Vec<String> {
        self.allowlist.allowed_urls()
    }

    pub fn is_url_allowed(&self, url: &str) -> bool {
        self.allowlist.is_url_allowed(url)
    }

    // =========================================================================
    // TLS and logging
    // =========================================================================

    /// TLS context, built on first call and shared afterwards
    pub fn tls_context(&self) -> Result<&TlsContext> {
        self.tls
            .get_or_try_init(|| TlsContext::from_config(&self.configuration))
    }

    pub fn loggers(&self) -> &LoggerRegistry {
        &self.loggers
    }

    pub fn log_metric(&self, channel: LoggerChannel, metric: &Metric) {
        self.loggers.log_metric(channel, metric);
    }
}
