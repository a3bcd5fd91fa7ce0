//! Run command - main monitoring loop

use anyhow::{Context, Result};
use clap::Args;
use dnslog_core::allowlist::{AllowlistCache, HttpAllowlistSource, Refresher};
use dnslog_core::config::SinkFormat;
use dnslog_core::source::LineSource;
use dnslog_core::{sink, Config, Pipeline};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::load_config;

/// Environment variable holding the allowlist URI
pub const ALLOWLIST_URI_ENV: &str = "DNSLOG_ALLOWLIST_URI";

/// How long shutdown waits for queued questions to drain
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Run command arguments
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Allowlist URI (overrides config)
    #[arg(long, env = ALLOWLIST_URI_ENV, value_name = "URI")]
    pub allowlist_uri: Option<String>,

    /// Seconds between allowlist checks
    #[arg(long, value_name = "SECS")]
    pub refresh_interval: Option<u64>,

    /// Timeout for a single allowlist request, in seconds
    #[arg(long, value_name = "SECS")]
    pub fetch_timeout: Option<u64>,

    /// Capacity of each pipeline queue
    #[arg(long, value_name = "N")]
    pub queue_capacity: Option<usize>,

    /// Host name stamped on events
    #[arg(long, value_name = "NAME")]
    pub host: Option<String>,

    /// Event output (log, json)
    #[arg(long, value_name = "FORMAT")]
    pub sink: Option<String>,

    /// Read questions from a file instead of stdin
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

impl RunArgs {
    /// Arguments for a bare `dnslog` invocation, where clap never sees `RunArgs`
    pub fn from_env() -> Self {
        Self {
            allowlist_uri: std::env::var(ALLOWLIST_URI_ENV).ok().filter(|uri| !uri.is_empty()),
            ..Self::default()
        }
    }
}

/// Execute the run command
pub fn execute(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(&args, config_path)?;
    config.validate().context("Configuration validation failed")?;

    let input = open_input(args.input.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("dnslog-worker")
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(serve(config, input));

    // a stdin read may still be parked on the blocking pool; it holds nothing left to flush
    runtime.shutdown_background();
    result
}

fn resolve_config(args: &RunArgs, config_path: Option<&Path>) -> Result<Config> {
    let mut config = load_config(config_path)?;

    if let Some(ref uri) = args.allowlist_uri {
        config.allowlist.uri = uri.clone();
    }
    if let Some(secs) = args.refresh_interval {
        config.allowlist.refresh_interval_secs = secs;
    }
    if let Some(secs) = args.fetch_timeout {
        config.allowlist.fetch_timeout_secs = secs;
    }
    if let Some(capacity) = args.queue_capacity {
        config.pipeline.queue_capacity = capacity;
    }
    if let Some(ref host) = args.host {
        config.pipeline.host = Some(host.clone());
    }
    if let Some(ref name) = args.sink {
        config.sink.format = SinkFormat::from_name(name)
            .with_context(|| format!("Unknown sink: {name} (expected log or json)"))?;
    }

    Ok(config)
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead + Send>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input: {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Host name for events: config, then the system host name
fn resolve_host(config: &Config) -> String {
    config
        .pipeline
        .host
        .clone()
        .or_else(|| gethostname::gethostname().into_string().ok())
        .map(|host| host.trim().to_string())
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

async fn serve(config: Config, input: Box<dyn BufRead + Send>) -> Result<()> {
    let host = resolve_host(&config);
    info!(host = %host, allowlist = %config.allowlist.uri, "Starting dnslog");

    let source = HttpAllowlistSource::new(&config.allowlist.uri, config.allowlist.fetch_timeout())
        .context("Failed to build allowlist client")?;
    let cache = AllowlistCache::initialize(&source)
        .await
        .context("Could not obtain the initial allowlist")?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let refresher = Refresher::new(source, cache.clone())
        .with_interval(config.allowlist.refresh_interval())
        .with_cycle_timeout(config.allowlist.fetch_timeout() * 2)
        .spawn(stop_rx);

    let pipeline = Pipeline::new()
        .with_capacity(config.pipeline.queue_capacity)
        .start(cache, sink::from_format(config.sink.format));

    let sender = pipeline.sender();
    let mut ingest = tokio::task::spawn_blocking(move || LineSource::new(input, host).pump(&sender));

    tokio::select! {
        joined = &mut ingest => match joined {
            Ok(Ok(count)) => info!(questions = count, "Input exhausted"),
            Ok(Err(e)) => warn!(error = %e, "Input failed"),
            Err(e) => warn!(error = %e, "Input task ended abnormally"),
        },
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for interrupt signal");
            }
            info!("Received interrupt signal, shutting down...");
        }
    }

    if stop_tx.send(true).is_err() {
        debug!("Refresher already stopped");
    }
    if let Err(e) = refresher.await {
        warn!(error = %e, "Refresher ended abnormally");
    }

    // closes intake even while the reader thread still holds a sender
    if tokio::time::timeout(SHUTDOWN_GRACE, pipeline.shutdown()).await.is_err() {
        warn!("Shutdown grace period elapsed, discarding queued events");
    }

    info!("dnslog stopped");
    Ok(())
}
