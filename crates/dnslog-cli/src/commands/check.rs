//! Check command - evaluate names against the live allowlist

use anyhow::{Context, Result};
use clap::Args;
use dnslog_core::allowlist::{AllowlistSnapshot, AllowlistSource, HttpAllowlistSource};
use dnslog_core::matcher::{self, DropReason, Verdict};
use std::path::Path;

use super::load_config;

/// Check command arguments
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Query names to evaluate
    #[arg(required = true, value_name = "NAME")]
    pub names: Vec<String>,

    /// Allowlist URI (overrides config)
    #[arg(long, env = super::run::ALLOWLIST_URI_ENV, value_name = "URI")]
    pub allowlist_uri: Option<String>,

    /// List rejected allowlist lines
    #[arg(long)]
    pub show_rejected: bool,
}

/// Execute check command
pub fn execute(args: CheckArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(uri) = args.allowlist_uri {
        config.allowlist.uri = uri;
    }
    config.validate().context("Configuration validation failed")?;

    let source = HttpAllowlistSource::new(&config.allowlist.uri, config.allowlist.fetch_timeout())
        .context("Failed to build allowlist client")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let snapshot = runtime
        .block_on(async { source.fetch().await?.into_snapshot() })
        .with_context(|| format!("Failed to fetch allowlist from {}", config.allowlist.uri))?;

    println!("Allowlist: {}", config.allowlist.uri);
    println!("  Version: {}", snapshot.version());
    println!("  Patterns: {}", snapshot.len());
    println!("  Rejected: {}", snapshot.rejected().len());
    if args.show_rejected {
        for rejected in snapshot.rejected() {
            println!(
                "    line {}: {} ({})",
                rejected.line, rejected.pattern, rejected.reason
            );
        }
    }
    println!();

    for name in &args.names {
        println!("{}", describe(name, &snapshot));
    }

    Ok(())
}

fn describe(name: &str, snapshot: &AllowlistSnapshot) -> String {
    match matcher::evaluate(name, snapshot) {
        Verdict::Forward => format!("FORWARD  {name}"),
        Verdict::Drop(DropReason::LocalDomain) => format!("DROP     {name}  (local domain)"),
        Verdict::Drop(DropReason::Allowlisted(index)) => {
            let pattern = snapshot
                .patterns()
                .get(index)
                .map_or("?", |p| p.as_str());
            format!("DROP     {name}  (matches {pattern})")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnslog_core::allowlist::ValidationToken;

    #[test]
    fn test_describe() {
        let snapshot = AllowlistSnapshot::from_body(
            ValidationToken::new("v1"),
            "^cdn\\.example\\.com$\n",
        );

        assert_eq!(describe("printer.local", &snapshot), "DROP     printer.local  (local domain)");
        assert_eq!(
            describe("cdn.example.com", &snapshot),
            "DROP     cdn.example.com  (matches ^cdn\\.example\\.com$)"
        );
        assert_eq!(describe("example.org", &snapshot), "FORWARD  example.org");
    }
}
