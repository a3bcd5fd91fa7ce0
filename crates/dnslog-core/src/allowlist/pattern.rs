//! Allow-pattern parsing
//!
//! Allowlist body format:
//! - One regular expression per line
//! - Lines starting with # are comments
//! - Empty lines are ignored
//! - Surrounding whitespace (including `\r`) is trimmed

use crate::error::{Error, ErrorKind};
use regex::Regex;
use std::fmt;
use tracing::warn;

/// One compiled allowlist rule
#[derive(Debug, Clone)]
pub struct AllowPattern {
    regex: Regex,
}

impl AllowPattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Pattern text as written in the list
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Unanchored search over `name`
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl fmt::Display for AllowPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line that could not be compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPattern {
    /// 1-based line number in the body
    pub line: usize,
    /// Pattern text
    pub pattern: String,
    /// Compiler message
    pub reason: String,
}

/// Result of parsing an allowlist body
#[derive(Debug, Default)]
pub struct ParsedPatterns {
    /// Usable patterns, in list order
    pub patterns: Vec<AllowPattern>,
    /// Lines that failed to compile
    pub rejected: Vec<RejectedPattern>,
}

/// Parse a body into ordered patterns.
///
/// A bad line never fails the whole list; it is reported and left out.
pub fn parse_patterns(body: &str) -> ParsedPatterns {
    let mut parsed = ParsedPatterns::default();

    for (idx, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match AllowPattern::new(line) {
            Ok(pattern) => parsed.patterns.push(pattern),
            Err(e) => {
                warn!(kind = %ErrorKind::MatchFailure, line = idx + 1, error = %e, "Skipping allowlist pattern");
                let reason = match e {
                    Error::InvalidPattern { reason, .. } => reason,
                    other => other.to_string(),
                };
                parsed.rejected.push(RejectedPattern {
                    line: idx + 1,
                    pattern: line.to_string(),
                    reason,
                });
            }
        }
    }

    parsed
}
