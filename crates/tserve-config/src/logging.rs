//! Named logger channels
//!
//! Three fixed channels, each bound once to its own append-only file:
//!
//! | channel        | file                | directory          |
//! |----------------|---------------------|--------------------|
//! | metrics        | `ts_metrics.log`    | `metrics_location` |
//! | model-metrics  | `model_metrics.log` | `metrics_location` |
//! | model-log      | `model_log.log`     | `log_location`     |
//!
//! Writes go through `tracing-appender` non-blocking workers. A failed or
//! dropped write never reaches the caller; it is counted and reported on the
//! process diagnostics instead.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tserve_core::{Metric, TsError};

use crate::keys;
use crate::resolver::ResolvedConfiguration;

/// Stable channel identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoggerChannel {
    Metrics,
    ModelMetrics,
    ModelLog,
}

impl LoggerChannel {
    pub const ALL: [Self; 3] = [Self::Metrics, Self::ModelMetrics, Self::ModelLog];

    pub fn name(self) -> &'static str {
        match self {
            Self::Metrics => "ts_metrics",
            Self::ModelMetrics => "model_metrics",
            Self::ModelLog => "model_log",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.log", self.name())
    }

    fn index(self) -> usize {
        match self {
            Self::Metrics => 0,
            Self::ModelMetrics => 1,
            Self::ModelLog => 2,
        }
    }

    fn directory_key(self) -> &'static str {
        match self {
            Self::Metrics | Self::ModelMetrics => keys::METRICS_LOCATION,
            Self::ModelLog => keys::LOG_LOCATION,
        }
    }
}

impl fmt::Display for LoggerChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a channel ended up writing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    File(PathBuf),
    /// Fallback when the file could not be created
    Stdout,
}

/// Metric line encoding, from `metrics_format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsFormat {
    Log,
    Json,
}

impl MetricsFormat {
    fn from_config(config: &ResolvedConfiguration) -> Self {
        match config.get(keys::METRICS_FORMAT).map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Log,
        }
    }
}

#[derive(Debug)]
struct ChannelSink {
    target: SinkTarget,
    writer: NonBlocking,
    _guard: WorkerGuard,
}

impl ChannelSink {
    fn bind(channel: LoggerChannel, dir: &Path) -> Self {
        match open_file(channel, dir) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                Self {
                    target: SinkTarget::File(dir.join(channel.file_name())),
                    writer,
                    _guard: guard,
                }
            }
            Err(e) => {
                warn!(
                    "Could not set up {} log in {:?}: {}. Using stdout only.",
                    channel, dir, e
                );
                let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
                Self {
                    target: SinkTarget::Stdout,
                    writer,
                    _guard: guard,
                }
            }
        }
    }
}

fn open_file(channel: LoggerChannel, dir: &Path) -> Result<RollingFileAppender, String> {
    std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(channel.name())
        .filename_suffix("log")
        .build(dir)
        .map_err(|e| e.to_string())
}

/// The three channel sinks, bound for the lifetime of the registry
#[derive(Debug)]
pub struct LoggerRegistry {
    sinks: [ChannelSink; 3],
    format: MetricsFormat,
    hostname: String,
    failures: AtomicU64,
}

impl LoggerRegistry {
    /// Bind every channel from the configured directories
    pub fn bind(config: &ResolvedConfiguration) -> Self {
        let dir = |channel: LoggerChannel| {
            PathBuf::from(config.get_property(channel.directory_key(), "logs"))
        };
        Self {
            sinks: LoggerChannel::ALL.map(|channel| ChannelSink::bind(channel, &dir(channel))),
            format: MetricsFormat::from_config(config),
            hostname: hostname(),
            failures: AtomicU64::new(0),
        }
    }

    pub fn target(&self, channel: LoggerChannel) -> &SinkTarget {
        &self.sinks[channel.index()].target
    }

    pub fn format(&self) -> MetricsFormat {
        self.format
    }

    /// Write one metric record
    pub fn log_metric(&self, channel: LoggerChannel, metric: &Metric) {
        let mut metric = metric.clone();
        if metric.host_name.is_none() {
            metric.host_name = Some(self.hostname.clone());
        }
        let line = match self.format {
            MetricsFormat::Log => metric.to_string(),
            MetricsFormat::Json => match metric.to_json() {
                Ok(json) => json,
                Err(e) => {
                    self.record_failure(channel, &e);
                    return;
                }
            },
        };
        self.log_line(channel, &line);
    }

    pub fn log_metrics(&self, channel: LoggerChannel, metrics: &[Metric]) {
        for metric in metrics {
            self.log_metric(channel, metric);
        }
    }

    /// Write a raw line (a newline is appended when missing)
    pub fn log_line(&self, channel: LoggerChannel, line: &str) {
        let mut record = line.to_string();
        if !record.ends_with('\n') {
            record.push('\n');
        }
        let mut writer = self.sinks[channel.index()].writer.clone();
        if let Err(e) = writer.write_all(record.as_bytes()) {
            self.record_failure(channel, &TsError::SinkFailure(e.to_string()));
        }
    }

    /// Failed writes plus lines dropped by a full buffer, across channels
    pub fn sink_failures(&self) -> u64 {
        let dropped: u64 = self
            .sinks
            .iter()
            .map(|sink| sink.writer.error_counter().dropped_lines() as u64)
            .sum();
        self.failures.load(Ordering::Relaxed) + dropped
    }

    fn record_failure(&self, channel: LoggerChannel, error: &TsError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        warn!("{} channel write failed: {}", channel, error);
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_string())
}
