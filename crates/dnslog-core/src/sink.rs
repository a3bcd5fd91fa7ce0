//! Event sinks
//!
//! A sink receives every forwarded [`DnsQueryEvent`]. Failures are reported
//! by the pipeline and the event is discarded; sinks are never retried.

use crate::config::SinkFormat;
use crate::error::Result;
use crate::event::DnsQueryEvent;
use std::io::{self, Write};
use tracing::info;

/// Destination for forwarded events
#[cfg_attr(test, mockall::automock)]
pub trait Sink: Send {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Take ownership of one event
    fn emit(&mut self, event: DnsQueryEvent) -> Result<()>;

    /// Flush buffered output at shutdown
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn emit(&mut self, event: DnsQueryEvent) -> Result<()> {
        (**self).emit(event)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Writes each event as a `tracing` record
#[derive(Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn emit(&mut self, event: DnsQueryEvent) -> Result<()> {
        info!(
            target: "dnslog::event",
            timestamp = %event.timestamp.to_rfc3339(),
            host = %event.host,
            query_name = %event.query_name,
            query_type = %event.query_type,
            "DNS query"
        );
        Ok(())
    }
}

/// Writes one JSON object per line
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<io::Stdout> {
    /// JSON lines on standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Sink for JsonLinesSink<W> {
    fn name(&self) -> &'static str {
        "json"
    }

    fn emit(&mut self, event: DnsQueryEvent) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Build the sink selected in configuration
pub fn from_format(format: SinkFormat) -> Box<dyn Sink> {
    match format {
        SinkFormat::Log => Box::new(LogSink),
        SinkFormat::Json => Box::new(JsonLinesSink::stdout()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DnsQuestion;

    #[test]
    fn test_json_lines() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.emit(DnsQueryEvent::accept(DnsQuestion::new("h1", "a.example.", "A"))).unwrap();
        sink.emit(DnsQueryEvent::accept(DnsQuestion::new("h1", "b.example.", "AAAA"))).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["queryName"], "b.example.");
        assert_eq!(second["queryType"], "AAAA");
        assert_eq!(second["host"], "h1");
    }

    #[test]
    fn test_boxed_sink_delegates() {
        let mut sink: Box<dyn Sink> = from_format(SinkFormat::Log);
        assert_eq!(sink.name(), "log");
        assert!(sink.emit(DnsQueryEvent::accept(DnsQuestion::new("h", "x.y", "A"))).is_ok());
    }
}
