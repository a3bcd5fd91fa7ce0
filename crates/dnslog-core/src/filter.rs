//! Filter stage
//!
//! Consumes decoded questions, checks each one against whatever allowlist
//! snapshot is current at that moment, and turns survivors into events.

use crate::allowlist::AllowlistCache;
use crate::event::{DnsQueryEvent, DnsQuestion};
use crate::matcher::{self, DropReason, Verdict};
use crate::pipeline::Stats;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

/// Allowlist filter between the inbound and outbound queues
#[derive(Debug, Clone)]
pub struct FilterStage {
    cache: AllowlistCache,
    stats: Arc<Stats>,
}

impl FilterStage {
    /// Create a stage reading from `cache`
    pub fn new(cache: AllowlistCache, stats: Arc<Stats>) -> Self {
        Self { cache, stats }
    }

    /// Evaluate one question; `Some` if it must be forwarded
    pub fn process(&self, question: DnsQuestion) -> Option<DnsQueryEvent> {
        self.stats.record_received();

        // one snapshot per question, never mixed
        let snapshot = self.cache.current();

        match matcher::evaluate(&question.name, &snapshot) {
            Verdict::Forward => {
                self.stats.record_forwarded();
                Some(DnsQueryEvent::accept(question))
            }
            Verdict::Drop(DropReason::LocalDomain) => {
                self.stats.record_dropped_local();
                trace!(name = %question.name, "Dropped local name");
                None
            }
            Verdict::Drop(DropReason::Allowlisted(idx)) => {
                self.stats.record_dropped_allowlisted();
                debug!(
                    name = %question.name,
                    pattern = %snapshot.patterns()[idx],
                    version = %snapshot.version(),
                    "Dropped allowlisted name"
                );
                None
            }
        }
    }

    /// Run until the inbound queue is empty and closed, or the outbound side is gone.
    ///
    /// When `stop` flips to `true` the inbound queue stops accepting
    /// questions; whatever is already queued is still processed. Order is
    /// preserved: events leave in the order questions arrived.
    pub async fn run(
        self,
        mut inbound: mpsc::Receiver<DnsQuestion>,
        outbound: mpsc::Sender<DnsQueryEvent>,
        mut stop: watch::Receiver<bool>,
    ) {
        let mut watching = true;

        loop {
            let question = tokio::select! {
                biased;
                question = inbound.recv() => match question {
                    Some(question) => question,
                    None => break,
                },
                changed = stop.changed(), if watching => {
                    watching = false;
                    if changed.is_ok() && *stop.borrow() {
                        debug!("Closing inbound queue");
                        inbound.close();
                    }
                    continue;
                }
            };

            let Some(event) = self.process(question) else {
                continue;
            };

            if outbound.send(event).await.is_err() {
                warn!("Sink queue closed, stopping filter stage");
                break;
            }
        }

        debug!("Filter stage finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::AllowlistSnapshot;

    fn stage(body: &str) -> (FilterStage, AllowlistCache, Arc<Stats>) {
        let cache = AllowlistCache::new(AllowlistSnapshot::from_body("v1".into(), body));
        let stats = Arc::new(Stats::default());
        (FilterStage::new(cache.clone(), Arc::clone(&stats)), cache, stats)
    }

    #[test]
    fn test_process_counts() {
        let (stage, _, stats) = stage("ads\\..*\n");

        assert!(stage.process(DnsQuestion::new("h", "app.internal.svc.cluster.local.", "A")).is_none());
        assert!(stage.process(DnsQuestion::new("h", "ads.tracker.net.", "A")).is_none());
        let event = stage.process(DnsQuestion::new("h", "www.example.com.", "AAAA")).unwrap();
        assert_eq!(event.query_type, "AAAA");

        let counts = stats.snapshot();
        assert_eq!(counts.questions_received, 3);
        assert_eq!(counts.dropped_local, 1);
        assert_eq!(counts.dropped_allowlisted, 1);
        assert_eq!(counts.forwarded, 1);
    }

    #[test]
    fn test_uses_snapshot_current_at_evaluation() {
        let (stage, cache, _) = stage("");
        assert!(stage.process(DnsQuestion::new("h", "ads.tracker.net", "A")).is_some());

        cache.replace(AllowlistSnapshot::from_body("v2".into(), "tracker\n"));
        assert!(stage.process(DnsQuestion::new("h", "ads.tracker.net", "A")).is_none());
    }

    #[tokio::test]
    async fn test_run_preserves_order() {
        let (stage, _, _) = stage("^skip\\.\n");
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let (_stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(stage.run(in_rx, out_tx, stop_rx));
        for name in ["one.com", "skip.com", "two.com", "three.com"] {
            in_tx.send(DnsQuestion::new("h", name, "A")).await.unwrap();
        }
        drop(in_tx);

        let mut names = Vec::new();
        while let Some(event) = out_rx.recv().await {
            names.push(event.query_name);
        }
        task.await.unwrap();

        assert_eq!(names, vec!["one.com", "two.com", "three.com"]);
    }

    #[tokio::test]
    async fn test_stop_drains_queued_questions() {
        let (stage, _, _) = stage("");
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let (stop_tx, stop_rx) = watch::channel(false);

        in_tx.send(DnsQuestion::new("h", "one.com", "A")).await.unwrap();
        in_tx.send(DnsQuestion::new("h", "two.com", "A")).await.unwrap();
        let task = tokio::spawn(stage.run(in_rx, out_tx, stop_rx));
        stop_tx.send(true).unwrap();

        let mut names = Vec::new();
        while let Some(event) = out_rx.recv().await {
            names.push(event.query_name);
        }
        task.await.unwrap();

        assert_eq!(names, vec!["one.com", "two.com"]);
        // producer is still alive but intake is closed
        assert!(in_tx.send(DnsQuestion::new("h", "three.com", "A")).await.is_err());
    }
}
