//! tserve CLI - inspect the configuration a serving node would start with
//!
//! Every subcommand runs the full startup resolution (defaults, properties
//! file, environment, arguments) and then reports on one part of it.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tserve_config::args::parse_property;
use tserve_config::{ConfigManager, StartupArgs};

mod commands;

use commands::{config, models, security};

#[derive(Parser)]
#[command(name = "tserve")]
#[command(author, version, about = "tserve - model serving configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    startup: StartupFlags,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Startup arguments, applied above every other configuration layer
#[derive(Args)]
struct StartupFlags {
    /// Models to load at startup (comma separated)
    #[arg(long, global = true, value_delimiter = ',')]
    models: Vec<String>,

    /// Model store directory
    #[arg(long, global = true)]
    model_store: Option<PathBuf>,

    /// Properties file to use instead of the default search (`TS_CONFIG_FILE` wins)
    #[arg(long, global = true)]
    ts_config_file: Option<PathBuf>,

    /// Neither read nor write configuration snapshots
    #[arg(long = "no-config-snapshots", global = true)]
    snapshot_disabled: bool,

    /// Log directory
    #[arg(long, global = true)]
    log_location: Option<PathBuf>,

    /// Extra property override (key=value), may be repeated
    #[arg(long = "property", short = 'D', global = true, value_parser = parse_property)]
    properties: Vec<(String, String)>,
}

impl From<StartupFlags> for StartupArgs {
    fn from(flags: StartupFlags) -> Self {
        Self {
            models: flags.models,
            model_store: flags.model_store,
            ts_config_file: flags.ts_config_file,
            snapshot_disabled: flags.snapshot_disabled,
            log_location: flags.log_location,
            properties: flags.properties,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved configuration
    Show {
        /// Print as JSON instead of properties
        #[arg(long)]
        json: bool,
    },

    /// Check a model URL against the allowlist (exit status 1 when refused)
    CheckUrl {
        url: String,
    },

    /// Look up a per-model override
    ModelValue {
        model: String,
        version: String,
        setting: String,
        /// Returned when no override is present
        #[arg(long, default_value_t = 0)]
        default: i64,
    },

    /// Build the TLS context and describe its source
    Tls,

    /// Write a configuration snapshot
    Snapshot {
        /// Target directory (defaults to `<log_location>/config`)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("tserve_cli={log_level},tserve_config={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let manager = ConfigManager::init(cli.startup.into())?;

    match cli.command {
        Commands::Show { json } => config::show(&manager, json),
        Commands::CheckUrl { url } => security::check_url(&manager, &url),
        Commands::ModelValue {
            model,
            version,
            setting,
            default,
        } => models::value(&manager, &model, &version, &setting, default),
        Commands::Tls => security::tls(&manager),
        Commands::Snapshot { dir } => config::snapshot(&manager, dir.as_deref()),
    }
}
