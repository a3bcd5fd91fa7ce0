//! Remotely managed allowlist
//!
//! The allowlist is a list of regular expressions describing DNS names that
//! are expected and should not be forwarded. It is:
//! - Downloaded from a remote source that exposes an `ETag`
//! - Materialized into immutable [`AllowlistSnapshot`]s
//! - Served from an [`AllowlistCache`] that swaps whole snapshots atomically
//! - Kept current by a [`Refresher`] running on its own schedule

mod cache;
mod pattern;
mod refresher;
mod snapshot;
mod source;

pub use cache::AllowlistCache;
pub use pattern::{parse_patterns, AllowPattern, ParsedPatterns, RejectedPattern};
pub use refresher::{RefreshOutcome, Refresher};
pub use snapshot::{AllowlistSnapshot, ValidationToken};
pub use source::{AllowlistSource, FetchedAllowlist, HttpAllowlistSource};
