//! Pipeline counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, shared between the filter stage and the sink consumer
#[derive(Debug, Default)]
pub struct Stats {
    questions_received: AtomicU64,
    forwarded: AtomicU64,
    dropped_local: AtomicU64,
    dropped_allowlisted: AtomicU64,
    emitted: AtomicU64,
    sink_failures: AtomicU64,
}

/// Point-in-time copy of [`Stats`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Questions taken off the inbound queue
    pub questions_received: u64,
    /// Questions that passed the filter
    pub forwarded: u64,
    /// Dropped for being under `local`
    pub dropped_local: u64,
    /// Dropped by an allowlist pattern
    pub dropped_allowlisted: u64,
    /// Events the sink accepted
    pub emitted: u64,
    /// Events the sink rejected
    pub sink_failures: u64,
}

impl Stats {
    pub(crate) fn record_received(&self) {
        self.questions_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_local(&self) {
        self.dropped_local.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_allowlisted(&self) {
        self.dropped_allowlisted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            questions_received: self.questions_received.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dropped_local: self.dropped_local.load(Ordering::Relaxed),
            dropped_allowlisted: self.dropped_allowlisted.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}
