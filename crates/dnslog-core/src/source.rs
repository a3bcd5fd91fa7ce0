//! Inbound question adapter
//!
//! Packet capture and DNS decoding happen outside this crate. A decoder
//! hands questions over as text lines:
//!
//! ```text
//! <query-name> [<query-type>]
//! ```
//!
//! `query-type` defaults to `A`. Blank lines and `#` comments are ignored.

use crate::error::{Error, Result};
use crate::event::DnsQuestion;
use crate::pipeline::QuestionSender;
use std::io::BufRead;
use tracing::{debug, info};

/// Record type assumed when a line carries only a name
pub const DEFAULT_QUERY_TYPE: &str = "A";

/// Parse one line into a question observed on `host`
pub fn parse_question_line(host: &str, line: &str) -> Option<DnsQuestion> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut fields = line.split_whitespace();
    let name = fields.next()?;
    let query_type = fields.next().unwrap_or(DEFAULT_QUERY_TYPE);
    if fields.next().is_some() {
        return None;
    }

    Some(DnsQuestion::new(host, name, query_type))
}

/// Feeds questions read from a line-oriented reader into the pipeline
pub struct LineSource<R> {
    reader: R,
    host: String,
}

impl<R: BufRead> LineSource<R> {
    /// Create a source stamping every question with `host`
    pub fn new(reader: R, host: impl Into<String>) -> Self {
        Self {
            reader,
            host: host.into(),
        }
    }

    /// Read until EOF, blocking on a full queue. Returns questions sent.
    ///
    /// Lines that are not valid UTF-8 are skipped; only a read error ends
    /// the input early. Runs on a plain thread; see
    /// [`QuestionSender::blocking_send`].
    pub fn pump(mut self, sender: &QuestionSender) -> Result<u64> {
        let mut sent = 0;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let Ok(line) = std::str::from_utf8(&buf) else {
                debug!(bytes = buf.len(), "Skipping question line that is not UTF-8");
                continue;
            };
            let Some(question) = parse_question_line(&self.host, line) else {
                if !line.trim().is_empty() {
                    debug!(line = %line.trim_end(), "Skipping malformed question line");
                }
                continue;
            };

            match sender.blocking_send(question) {
                Ok(()) => sent += 1,
                Err(Error::PipelineClosed) => {
                    info!("Pipeline closed, stopping input");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(sent)
    }
}
