//! Error types for dnslog-core
//!
//! Centralized error handling using `thiserror` for ergonomic error definitions.

use std::fmt;
use thiserror::Error;

/// Main error type for dnslog-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The initial allowlist could not be installed; the process must not serve
    #[error("Startup failed: {0}")]
    Startup(#[source] Box<Error>),

    /// HTTP transport failure talking to the allowlist source
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Allowlist source answered with a non-success status
    #[error("Allowlist source returned HTTP {status} for {uri}")]
    HttpStatus {
        /// Status code
        status: u16,
        /// Requested URI
        uri: String,
    },

    /// Allowlist source did not answer within the configured timeout
    #[error("Allowlist source timed out after {secs}s")]
    Timeout {
        /// Timeout in seconds
        secs: u64,
    },

    /// Response carried no `ETag` header
    #[error("Validation token (ETag) missing from allowlist response")]
    MissingValidationToken,

    /// Response carried no `Content-Length` header
    #[error("Content-Length missing from allowlist response")]
    MissingContentLength,

    /// Downloaded body is shorter or longer than the declared length
    #[error("Incomplete allowlist download: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Declared content length
        expected: u64,
        /// Bytes actually received
        actual: u64,
    },

    /// Allowlist pattern failed to compile
    #[error("Invalid allowlist pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Pattern text
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// Sink rejected an event
    #[error("Sink error: {0}")]
    Sink(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the missing config file
        path: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    ConfigValue {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// Inbound queue was closed while a producer was still sending
    #[error("Pipeline closed")]
    PipelineClosed,

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes. Only [`ErrorKind::StartupFatal`] stops the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No initial allowlist or no inbound source
    StartupFatal,
    /// One refresh cycle failed; the previous snapshot stays current
    RefreshCycleFailure,
    /// A single pattern is unusable and never matches
    MatchFailure,
    /// The sink rejected one event, which is discarded
    SinkFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartupFatal => "startup_fatal",
            Self::RefreshCycleFailure => "refresh_cycle_failure",
            Self::MatchFailure => "match_failure",
            Self::SinkFailure => "sink_failure",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Wrap an error raised while bringing the process up
    pub fn startup(err: Error) -> Self {
        match err {
            already @ Self::Startup(_) => already,
            other => Self::Startup(Box::new(other)),
        }
    }

    /// Create a sink error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink(message.into())
    }

    /// Create a config value error
    pub fn config_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Failure class when this error is reported outside startup
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Startup(_)
            | Self::Config(_)
            | Self::ConfigNotFound { .. }
            | Self::ConfigValue { .. }
            | Self::TomlParse(_) => ErrorKind::StartupFatal,
            Self::InvalidPattern { .. } => ErrorKind::MatchFailure,
            Self::Sink(_) | Self::Json(_) => ErrorKind::SinkFailure,
            _ => ErrorKind::RefreshCycleFailure,
        }
    }
}
