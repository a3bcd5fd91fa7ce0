//! Immutable allowlist versions

use super::pattern::{parse_patterns, AllowPattern, RejectedPattern};
use std::fmt;

/// Opaque content identifier from the allowlist source (an `ETag`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationToken(String);

impl ValidationToken {
    /// Wrap a raw header value
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ValidationToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// One fully materialized allowlist tied to its validation token.
///
/// Never mutated after construction; a new version replaces it wholesale.
#[derive(Debug)]
pub struct AllowlistSnapshot {
    version: ValidationToken,
    patterns: Vec<AllowPattern>,
    rejected: Vec<RejectedPattern>,
}

impl AllowlistSnapshot {
    /// Build from already compiled patterns
    pub fn new(version: ValidationToken, patterns: Vec<AllowPattern>) -> Self {
        Self {
            version,
            patterns,
            rejected: Vec::new(),
        }
    }

    /// Parse and compile a downloaded body
    pub fn from_body(version: ValidationToken, body: &str) -> Self {
        let parsed = parse_patterns(body);
        Self {
            version,
            patterns: parsed.patterns,
            rejected: parsed.rejected,
        }
    }

    /// Validation token this snapshot was built from
    pub fn version(&self) -> &ValidationToken {
        &self.version
    }

    /// Patterns in list order
    pub fn patterns(&self) -> &[AllowPattern] {
        &self.patterns
    }

    /// Lines that failed to compile
    pub fn rejected(&self) -> &[RejectedPattern] {
        &self.rejected
    }

    /// Number of usable patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when no pattern is usable
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
