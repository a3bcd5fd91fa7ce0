//! Background allowlist refresh
//!
//! Each cycle probes the source's validation token and only downloads when
//! it differs from the installed snapshot. A failed cycle leaves the cache
//! untouched and the next tick proceeds as usual.

use super::cache::AllowlistCache;
use super::snapshot::ValidationToken;
use super::source::AllowlistSource;
use crate::config::DEFAULT_REFRESH_INTERVAL_SECS;
use crate::error::{Error, ErrorKind, Result};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// What a refresh cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Token matched the installed snapshot
    Unchanged,
    /// A new snapshot was installed
    Updated {
        /// Token that was replaced
        previous: ValidationToken,
        /// Token now installed
        current: ValidationToken,
        /// Usable patterns in the new snapshot
        patterns: usize,
    },
}

/// Polls an [`AllowlistSource`] and swaps new versions into the cache
pub struct Refresher<S> {
    source: S,
    cache: AllowlistCache,
    interval: Duration,
    cycle_timeout: Duration,
}

impl<S: AllowlistSource> Refresher<S> {
    /// Create a refresher with the default 5 minute interval
    pub fn new(source: S, cache: AllowlistCache) -> Self {
        let interval = Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS);
        Self {
            source,
            cache,
            interval,
            cycle_timeout: interval,
        }
    }

    /// Set the poll interval. The cycle timeout follows unless set explicitly afterwards.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self.cycle_timeout = interval;
        self
    }

    /// Bound a whole cycle (probe plus download)
    pub fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    /// Poll interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one cycle without a timeout
    pub async fn refresh_once(&self) -> Result<RefreshOutcome> {
        let token = self.source.probe().await?;
        let installed = self.cache.current();

        if &token == installed.version() {
            debug!(version = %token, "Allowlist unchanged");
            return Ok(RefreshOutcome::Unchanged);
        }

        let fetched = self.source.fetch().await?;
        let snapshot = fetched.into_snapshot()?;

        // The list may have moved again between probe and download; the
        // downloaded token is the one describing the body.
        if snapshot.version() == installed.version() {
            return Ok(RefreshOutcome::Unchanged);
        }

        let current = snapshot.version().clone();
        let patterns = snapshot.len();
        let previous = self.cache.replace(snapshot);

        Ok(RefreshOutcome::Updated {
            previous: previous.version().clone(),
            current,
            patterns,
        })
    }

    /// Run one cycle bounded by the cycle timeout
    pub async fn refresh_cycle(&self) -> Result<RefreshOutcome> {
        match time::timeout(self.cycle_timeout, self.refresh_once()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                secs: self.cycle_timeout.as_secs(),
            }),
        }
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first poll happens one interval after start; initial population
    /// is done by [`AllowlistCache::initialize`].
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "Allowlist refresher started");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.report(self.refresh_cycle().await),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Allowlist refresher stopped");
    }

    fn report(&self, result: Result<RefreshOutcome>) {
        match result {
            Ok(RefreshOutcome::Unchanged) => {}
            Ok(RefreshOutcome::Updated {
                previous,
                current,
                patterns,
            }) => {
                info!(previous = %previous, version = %current, patterns, "Allowlist updated");
            }
            Err(e) => {
                warn!(
                    kind = %ErrorKind::RefreshCycleFailure,
                    error = %e,
                    version = %self.cache.version(),
                    "Allowlist refresh failed, keeping current version"
                );
            }
        }
    }
}

impl<S: AllowlistSource + 'static> Refresher<S> {
    /// Spawn [`Refresher::run`] onto the current runtime
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
