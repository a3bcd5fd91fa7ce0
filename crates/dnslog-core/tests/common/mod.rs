//! Shared test doubles

#![allow(dead_code)]

use dnslog_core::allowlist::{AllowlistSource, FetchedAllowlist, ValidationToken};
use dnslog_core::{DnsQueryEvent, Error, Result, Sink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory allowlist source
#[derive(Clone, Default)]
pub struct StaticSource {
    inner: Arc<Mutex<Published>>,
    fetches: Arc<AtomicUsize>,
}

#[derive(Default)]
struct Published {
    token: Option<String>,
    body: String,
    declared_length: Option<u64>,
}

impl StaticSource {
    pub fn new(token: &str, body: &str) -> Self {
        let source = Self::default();
        source.publish(token, body);
        source
    }

    pub fn publish(&self, token: &str, body: &str) {
        let mut inner = self.inner.lock();
        inner.token = Some(token.to_string());
        inner.body = body.to_string();
        inner.declared_length = None;
    }

    /// Advertise a length different from the body
    pub fn declare_length(&self, length: u64) {
        self.inner.lock().declared_length = Some(length);
    }

    /// Stop sending a validation token
    pub fn drop_token(&self) {
        self.inner.lock().token = None;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl AllowlistSource for StaticSource {
    async fn probe(&self) -> Result<ValidationToken> {
        let inner = self.inner.lock();
        inner
            .token
            .as_deref()
            .map(ValidationToken::new)
            .ok_or(Error::MissingValidationToken)
    }

    async fn fetch(&self) -> Result<FetchedAllowlist> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock();
        let token = inner
            .token
            .as_deref()
            .map(ValidationToken::new)
            .ok_or(Error::MissingValidationToken)?;
        let body = inner.body.as_bytes().to_vec();
        Ok(FetchedAllowlist {
            token,
            declared_length: inner.declared_length.unwrap_or(body.len() as u64),
            body,
        })
    }
}

/// Sink that records events, optionally holding the first one until released
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DnsQueryEvent>>>,
    gate: Option<std::sync::mpsc::Receiver<()>>,
}

impl RecordingSink {
    pub fn new() -> (Self, Arc<Mutex<Vec<DnsQueryEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Self {
            events: Arc::clone(&events),
            gate: None,
        };
        (sink, events)
    }

    /// Sink that stalls until the returned sender sends or is dropped
    pub fn gated() -> (Self, Arc<Mutex<Vec<DnsQueryEvent>>>, std::sync::mpsc::Sender<()>) {
        let (tx, rx) = std::sync::mpsc::channel();
        let (mut sink, events) = Self::new();
        sink.gate = Some(rx);
        (sink, events, tx)
    }
}

impl Sink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn emit(&mut self, event: DnsQueryEvent) -> Result<()> {
        if let Some(gate) = self.gate.take() {
            let _ = gate.recv();
        }
        self.events.lock().push(event);
        Ok(())
    }
}
