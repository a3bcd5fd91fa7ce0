//! CLI commands

pub mod check;
pub mod completions;
pub mod config;
pub mod run;

use anyhow::{Context, Result};
use clap::Subcommand;
use dnslog_core::Config;
use std::path::{Path, PathBuf};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "dnslog.toml";

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Monitor questions read from stdin (main command)
    Run(run::RunArgs),

    /// Show how names would be treated by the current allowlist
    Check(check::CheckArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Load the explicit config file, else `./dnslog.toml`, else defaults
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Config::load(&local)
            .with_context(|| format!("Failed to load config from {}", local.display()));
    }

    Ok(Config::default())
}
