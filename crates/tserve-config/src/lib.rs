//! tserve Config - configuration resolution and security gating
//!
//! Resolves the effective value of every runtime setting from defaults, a
//! properties file, the environment and startup arguments, and exposes the
//! pieces built on top of that map: per-model overrides, the download URL
//! allowlist, the TLS context and the named logger channels.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]

pub mod allowlist;
pub mod args;
pub mod env;
pub mod keys;
pub mod logging;
pub mod manager;
pub mod overrides;
pub mod properties;
pub mod resolver;
pub mod snapshot;
pub mod tls;

pub use allowlist::{UrlAllowlist, UrlPattern, DEFAULT_ALLOWED_URLS};
pub use args::StartupArgs;
pub use logging::{LoggerChannel, LoggerRegistry};
pub use manager::ConfigManager;
pub use overrides::{FromOverride, ModelOverrides};
pub use resolver::{PropertyResolver, ResolvedConfiguration};
pub use tls::{TlsContext, TlsSource};
pub use tserve_core::{Result, TsError};
