//! Logging initialization
//!
//! Console logs go to stderr so stdout stays free for the JSON event sink.
//! `--log-file` mirrors the same records, without colors, whatever the
//! console format.

use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

use crate::args::{Args, LogFormat};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize logging based on CLI arguments
pub fn init(args: &Args) -> Result<()> {
    let mut layers = vec![console_layer(args.log_format, args.verbose)];
    if let Some(ref path) = args.log_file {
        layers.push(file_layer(path, args.log_format)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(args))
        .init();

    Ok(())
}

fn env_filter(args: &Args) -> EnvFilter {
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

fn console_layer(format: LogFormat, verbose: u8) -> BoxedLayer {
    match format {
        LogFormat::Text => fmt::layer()
            .with_writer(io::stderr)
            .with_target(verbose >= 2)
            .with_thread_ids(verbose >= 3)
            .with_file(verbose >= 3)
            .with_line_number(verbose >= 3)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(io::stderr).boxed(),
    }
}

fn file_layer(path: &Path, format: LogFormat) -> Result<BoxedLayer> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;
    let writer = Mutex::new(file);

    Ok(match format {
        LogFormat::Text => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
    })
}
