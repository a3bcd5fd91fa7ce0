//! Inbound questions and outbound events

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A DNS question already decoded by the capture side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    /// Machine the question was observed on
    pub host: String,
    /// Question name as it appeared on the wire (may end in `.`)
    pub name: String,
    /// Record type mnemonic (`A`, `AAAA`, `TYPE65`, ...)
    pub query_type: String,
}

impl DnsQuestion {
    /// Create a new question
    pub fn new(host: impl Into<String>, name: impl Into<String>, query_type: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
            query_type: query_type.into(),
        }
    }
}

/// A question that survived filtering. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsQueryEvent {
    /// When the filter stage accepted the question
    pub timestamp: DateTime<Utc>,
    /// Machine the question was observed on
    pub host: String,
    /// Question name, verbatim
    pub query_name: String,
    /// Record type, verbatim
    pub query_type: String,
}

impl DnsQueryEvent {
    /// Stamp a question with the current time.
    ///
    /// Capture time is not carried through the decoder, so filter time stands in for it.
    pub fn accept(question: DnsQuestion) -> Self {
        Self {
            timestamp: Utc::now(),
            host: question.host,
            query_name: question.name,
            query_type: question.query_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_keeps_fields_verbatim() {
        let before = Utc::now();
        let event = DnsQueryEvent::accept(DnsQuestion::new("node-1", "www.example.com.", "HTTPS"));

        assert_eq!(event.host, "node-1");
        assert_eq!(event.query_name, "www.example.com.");
        assert_eq!(event.query_type, "HTTPS");
        assert!(event.timestamp >= before);
    }

    #[test]
    fn test_serialized_field_names() {
        let event = DnsQueryEvent::accept(DnsQuestion::new("h", "a.b", "A"));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["queryName"], "a.b");
        assert_eq!(json["queryType"], "A");
        assert!(json.get("timestamp").is_some());
    }
}
