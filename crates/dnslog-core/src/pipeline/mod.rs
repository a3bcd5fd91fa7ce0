//! Question processing pipeline
//!
//! ```text
//! producer ──► [inbound queue] ──► FilterStage ──► [outbound queue] ──► Sink
//! ```
//!
//! Both queues are bounded. A full queue blocks the sender; nothing is
//! dropped for lack of room. Shutdown drains: the inbound queue stops
//! accepting questions (also when every [`QuestionSender`] is gone), the
//! filter stage empties it and closes the outbound queue, and the sink
//! consumer empties that in turn.

mod stats;

pub use stats::{Stats, StatsSnapshot};

use crate::allowlist::AllowlistCache;
use crate::config::DEFAULT_QUEUE_CAPACITY;
use crate::error::{Error, ErrorKind, Result};
use crate::event::{DnsQueryEvent, DnsQuestion};
use crate::filter::FilterStage;
use crate::sink::Sink;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Producer handle on the inbound queue
#[derive(Debug, Clone)]
pub struct QuestionSender {
    tx: mpsc::Sender<DnsQuestion>,
}

impl QuestionSender {
    /// Enqueue a question, waiting while the queue is full
    pub async fn send(&self, question: DnsQuestion) -> Result<()> {
        self.tx.send(question).await.map_err(|_| Error::PipelineClosed)
    }

    /// Enqueue from a non-async thread, blocking while the queue is full.
    ///
    /// Must not be called from inside the async runtime.
    pub fn blocking_send(&self, question: DnsQuestion) -> Result<()> {
        self.tx.blocking_send(question).map_err(|_| Error::PipelineClosed)
    }

    /// Free slots in the inbound queue
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// Pipeline builder
#[derive(Debug, Clone)]
pub struct Pipeline {
    capacity: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Pipeline with the default queue capacity
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Set the capacity of each queue (minimum 1)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Create the queues and spawn the filter and sink tasks.
    ///
    /// Must be called from within a Tokio runtime. The sink runs on the
    /// blocking pool since sinks do synchronous I/O.
    pub fn start<S: Sink + 'static>(self, cache: AllowlistCache, sink: S) -> PipelineHandle {
        let stats = Arc::new(Stats::default());
        let (question_tx, question_rx) = mpsc::channel(self.capacity);
        let (event_tx, event_rx) = mpsc::channel(self.capacity);
        let (stop_tx, stop_rx) = watch::channel(false);

        let filter = FilterStage::new(cache, Arc::clone(&stats));
        let filter_task = tokio::spawn(filter.run(question_rx, event_tx, stop_rx));

        let sink_stats = Arc::clone(&stats);
        let sink_task = tokio::task::spawn_blocking(move || drain_into(sink, event_rx, &sink_stats));

        info!(capacity = self.capacity, "Pipeline started");

        PipelineHandle {
            sender: QuestionSender { tx: question_tx },
            stop: stop_tx,
            filter_task,
            sink_task,
            stats,
        }
    }
}

fn drain_into<S: Sink>(mut sink: S, mut events: mpsc::Receiver<DnsQueryEvent>, stats: &Stats) {
    while let Some(event) = events.blocking_recv() {
        let name = event.query_name.clone();
        match sink.emit(event) {
            Ok(()) => stats.record_emitted(),
            Err(e) => {
                stats.record_sink_failure();
                warn!(kind = %ErrorKind::SinkFailure, sink = sink.name(), name = %name, error = %e, "Event discarded");
            }
        }
    }

    if let Err(e) = sink.flush() {
        warn!(sink = sink.name(), error = %e, "Sink flush failed");
    }
    debug!(sink = sink.name(), "Sink consumer finished");
}

/// Running pipeline
#[derive(Debug)]
pub struct PipelineHandle {
    sender: QuestionSender,
    stop: watch::Sender<bool>,
    filter_task: JoinHandle<()>,
    sink_task: JoinHandle<()>,
    stats: Arc<Stats>,
}

impl PipelineHandle {
    /// Another producer handle on the inbound queue
    pub fn sender(&self) -> QuestionSender {
        self.sender.clone()
    }

    /// Live counters
    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    /// Stop intake, drain both queues and wait for the tasks.
    ///
    /// Outstanding [`QuestionSender`] clones may stay alive; their next
    /// send fails with [`Error::PipelineClosed`]. Questions queued before
    /// the call are still filtered and emitted.
    pub async fn shutdown(self) -> StatsSnapshot {
        let Self {
            sender,
            stop,
            filter_task,
            sink_task,
            stats,
        } = self;
        drop(sender);
        if stop.send(true).is_err() {
            debug!("Filter stage already finished");
        }

        if let Err(e) = filter_task.await {
            warn!(error = %e, "Filter task ended abnormally");
        }
        if let Err(e) = sink_task.await {
            warn!(error = %e, "Sink task ended abnormally");
        }

        let totals = stats.snapshot();
        info!(
            received = totals.questions_received,
            forwarded = totals.forwarded,
            dropped_local = totals.dropped_local,
            dropped_allowlisted = totals.dropped_allowlisted,
            emitted = totals.emitted,
            sink_failures = totals.sink_failures,
            "Pipeline stopped"
        );
        totals
    }
}
