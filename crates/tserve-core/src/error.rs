//! Error types for tserve

use thiserror::Error;

/// Main error type for tserve
#[derive(Error, Debug)]
pub enum TsError {
    /// The process configuration was read before `init` published it.
    #[error("Configuration has not been initialized")]
    Uninitialized,

    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed per-model override data. Never fatal: callers degrade to an
    /// empty override table and keep this around for reporting.
    #[error("Parse degraded: {0}")]
    ParseDegraded(String),

    /// A logger channel could not write a record.
    #[error("Sink failure: {0}")]
    SinkFailure(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TsError {
    /// Build a configuration error from anything printable.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error must abort startup.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ParseDegraded(_) | Self::SinkFailure(_))
    }
}

/// Result type alias for tserve operations
pub type Result<T> = std::result::Result<T, TsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            TsError::Uninitialized.to_string(),
            "Configuration has not been initialized"
        );
        assert_eq!(
            TsError::config("keystore missing").to_string(),
            "Configuration error: keystore missing"
        );
    }

    #[test]
    fn test_fatality() {
        assert!(TsError::Uninitialized.is_fatal());
        assert!(TsError::config("x").is_fatal());
        assert!(!TsError::ParseDegraded("bad json".into()).is_fatal());
        assert!(!TsError::SinkFailure("disk full".into()).is_fatal());
    }
}
