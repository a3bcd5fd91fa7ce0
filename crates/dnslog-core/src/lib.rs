//! # dnslog core
//!
//! Passive DNS query monitoring with a remotely managed allowlist.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Matching** - decides whether a question name is whitelisted
//! - **Allowlist** - snapshot cache, remote source and background refresher
//! - **Filter stage** - turns non-whitelisted questions into events
//! - **Pipeline** - bounded queues between producer, filter and sink
//! - **Configuration** - TOML configuration with defaults
//!
//! Packet capture and DNS wire decoding live outside this crate; producers
//! push already decoded [`DnsQuestion`]s into the pipeline.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dnslog_core::allowlist::{AllowlistCache, HttpAllowlistSource, Refresher};
//! use dnslog_core::sink::LogSink;
//! use dnslog_core::{DnsQuestion, Pipeline};
//! use std::time::Duration;
//!
//! # async fn demo() -> dnslog_core::Result<()> {
//! let source = HttpAllowlistSource::new("https://example.net/allow.txt", Duration::from_secs(30))?;
//! let cache = AllowlistCache::initialize(&source).await?;
//!
//! let (_stop, stop_rx) = tokio::sync::watch::channel(false);
//! Refresher::new(source, cache.clone()).spawn(stop_rx);
//!
//! let pipeline = Pipeline::new().start(cache, LogSink);
//! pipeline.sender().send(DnsQuestion::new("node-1", "www.example.com.", "A")).await?;
//! pipeline.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod allowlist;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod matcher;
pub mod pipeline;
pub mod sink;
pub mod source;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use event::{DnsQueryEvent, DnsQuestion};
pub use filter::FilterStage;
pub use matcher::{DropReason, Verdict};
pub use pipeline::{Pipeline, PipelineHandle, QuestionSender, Stats, StatsSnapshot};
pub use sink::Sink;
