//! Config command - configuration management

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use dnslog_core::Config;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{load_config, DEFAULT_CONFIG_FILE};

const PLACEHOLDER_URI: &str = "https://lists.example.net/dns-allowlist.txt";

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Generate a configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Allowlist URI to write into the file
        #[arg(long, value_name = "URI")]
        allowlist_uri: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Config file to validate
        file: PathBuf,
    },
}

/// Execute config command
pub fn execute(args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(config_path),
        ConfigAction::Generate {
            output,
            allowlist_uri,
            force,
        } => generate_config(&output, allowlist_uri, force),
        ConfigAction::Validate { file } => validate_config(&file),
    }
}

fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let toml_str = config.to_toml().context("Failed to serialize config")?;
    println!("{toml_str}");
    Ok(())
}

fn render_config(allowlist_uri: Option<String>) -> Result<String> {
    let mut config = Config::default();
    config.allowlist.uri = allowlist_uri.unwrap_or_else(|| PLACEHOLDER_URI.to_string());

    let toml_str = config.to_toml().context("Failed to serialize config")?;

    Ok(format!(
        "# dnslog configuration\n\
         # allowlist.uri must serve one regular expression per line with an ETag header\n\n\
         {toml_str}"
    ))
}

fn generate_config(output: &Path, allowlist_uri: Option<String>, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let content = render_config(allowlist_uri)?;
    std::fs::write(output, content)
        .with_context(|| format!("Failed to write config to {}", output.display()))?;

    info!(path = %output.display(), "Generated config file");
    println!("Configuration file generated: {}", output.display());
    Ok(())
}

fn validate_config(file: &Path) -> Result<()> {
    let config = Config::load(file)
        .with_context(|| format!("Failed to load config from {}", file.display()))?;
    config.validate().context("Configuration validation failed")?;

    println!("✓ Configuration is valid");
    println!("  Allowlist: {}", config.allowlist.uri);
    println!("  Refresh interval: {}s", config.allowlist.refresh_interval_secs);
    println!("  Fetch timeout: {}s", config.allowlist.fetch_timeout_secs);
    println!("  Queue capacity: {}", config.pipeline.queue_capacity);
    println!("  Sink: {:?}", config.sink.format);

    Ok(())
}
