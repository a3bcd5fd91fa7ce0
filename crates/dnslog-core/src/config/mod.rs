//! Configuration management for dnslog
//!
//! Strongly-typed configuration with TOML support. Every section has
//! defaults except the allowlist URI, which must be supplied.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default allowlist poll interval (5 minutes)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Default timeout for a single allowlist request
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default capacity of each pipeline queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote allowlist settings
    pub allowlist: AllowlistConfig,

    /// Queue sizing and event metadata
    pub pipeline: PipelineConfig,

    /// Event output
    pub sink: SinkConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Error::from)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let uri = self.allowlist.uri.trim();
        if uri.is_empty() {
            return Err(Error::config_value("allowlist.uri", "must be set"));
        }
        if !(uri.starts_with("http://") || uri.starts_with("https://")) {
            return Err(Error::config_value(
                "allowlist.uri",
                format!("unsupported scheme in '{uri}' (expected http or https)"),
            ));
        }

        if self.allowlist.refresh_interval_secs == 0 {
            return Err(Error::config_value(
                "allowlist.refresh_interval_secs",
                "must be greater than zero",
            ));
        }

        if self.allowlist.fetch_timeout_secs == 0 {
            return Err(Error::config_value(
                "allowlist.fetch_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.pipeline.queue_capacity == 0 {
            return Err(Error::config_value(
                "pipeline.queue_capacity",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Remote allowlist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowlistConfig {
    /// URI of the pattern list
    pub uri: String,
    /// Seconds between validation-token checks
    pub refresh_interval_secs: u64,
    /// Upper bound on a single request
    pub fetch_timeout_secs: u64,
}

impl AllowlistConfig {
    /// Poll interval as a `Duration`
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Request timeout as a `Duration`
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for AllowlistConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// In-flight items per queue
    pub queue_capacity: usize,
    /// Host name stamped on events (machine hostname when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            host: None,
        }
    }
}

/// Sink configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Output format
    pub format: SinkFormat,
}

/// Where forwarded events go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    /// One `tracing` record per event
    #[default]
    Log,
    /// One JSON object per line on stdout
    Json,
}

impl SinkFormat {
    /// Parse from a user-supplied name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "log" | "tracing" => Some(Self::Log),
            "json" | "jsonl" => Some(Self::Json),
            _ => None,
        }
    }
}
