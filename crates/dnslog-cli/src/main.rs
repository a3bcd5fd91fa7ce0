//! dnslog CLI
//!
//! Command-line interface for the DNS query monitor.

mod args;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use args::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(&args)?;

    let result = run(args);

    if let Err(ref e) = result {
        error!("Fatal error: {:#}", e);
    }

    result
}

fn run(args: Args) -> Result<()> {
    let config_path = args.config.clone();

    match args.command {
        Some(commands::Command::Run(run_args)) => commands::run::execute(run_args, config_path.as_deref()),
        Some(commands::Command::Check(check_args)) => {
            commands::check::execute(check_args, config_path.as_deref())
        }
        Some(commands::Command::Config(config_args)) => {
            commands::config::execute(config_args, config_path.as_deref())
        }
        Some(commands::Command::Completions(comp_args)) => commands::completions::execute(comp_args),
        None => commands::run::execute(commands::run::RunArgs::from_env(), config_path.as_deref()),
    }
}
