//! Command-line argument parsing

use crate::commands::Command;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// dnslog - passive DNS query monitor
///
/// Reads decoded DNS questions, drops names matched by a remotely managed
/// allowlist (and anything under `.local`), and forwards the rest.
#[derive(Parser, Debug)]
#[command(name = "dnslog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Subcommand to execute (default: run)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for logs
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Log file path
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// Compact format
    Compact,
}
