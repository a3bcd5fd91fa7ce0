//! Integration tests for allowlist initialization and refresh

mod common;

use common::StaticSource;
use dnslog_core::allowlist::{AllowlistCache, RefreshOutcome, Refresher};
use dnslog_core::{matcher, Error, ErrorKind};
use std::sync::Arc;
use std::time::Duration;

// ============ Initialization ============

#[tokio::test]
async fn test_initialize_installs_first_snapshot() {
    let source = StaticSource::new("\"1a2b\"", "# expected traffic\nads\\..*\n\n^ntp\\.\n");
    let cache = AllowlistCache::initialize(&source).await.unwrap();

    let snapshot = cache.current();
    assert_eq!(snapshot.version().as_str(), "\"1a2b\"");
    assert_eq!(snapshot.len(), 2);
    assert!(matcher::matches("ntp.ubuntu.com.", &snapshot));
}

#[tokio::test]
async fn test_initialize_without_token_is_fatal() {
    let source = StaticSource::new("v1", "a\n");
    source.drop_token();

    let err = AllowlistCache::initialize(&source).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StartupFatal);
    assert!(matches!(err, Error::Startup(ref inner) if matches!(**inner, Error::MissingValidationToken)));
}

#[tokio::test]
async fn test_initialize_with_partial_download_is_fatal() {
    let source = StaticSource::new("v1", "ads\\..*\n");
    source.declare_length(4096);

    let err = AllowlistCache::initialize(&source).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StartupFatal);
    assert!(err.to_string().contains("4096"));
}

#[tokio::test]
async fn test_invalid_patterns_do_not_block_startup() {
    let source = StaticSource::new("v1", "(broken\nads\\..*\n[also-broken\n");
    let cache = AllowlistCache::initialize(&source).await.unwrap();

    let snapshot = cache.current();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.rejected().len(), 2);
    assert!(matcher::matches("ads.tracker.net", &snapshot));
    assert!(!matcher::matches("www.example.com", &snapshot));
}

// ============ Refresh ============

#[tokio::test]
async fn test_identical_tokens_do_not_rebuild() {
    let source = StaticSource::new("v1", "a\\.com\n");
    let cache = AllowlistCache::initialize(&source).await.unwrap();
    let refresher = Refresher::new(source.clone(), cache.clone());
    let installed = cache.current();

    for _ in 0..2 {
        assert_eq!(refresher.refresh_cycle().await.unwrap(), RefreshOutcome::Unchanged);
    }

    assert!(Arc::ptr_eq(&installed, &cache.current()));
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn test_mismatched_length_leaves_version_unchanged() {
    let source = StaticSource::new("v1", "a\\.com\n");
    let cache = AllowlistCache::initialize(&source).await.unwrap();
    let refresher = Refresher::new(source.clone(), cache.clone());

    source.publish("v2", "b\\.com\n");
    source.declare_length(3);

    let err = refresher.refresh_cycle().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RefreshCycleFailure);
    assert_eq!(cache.version().as_str(), "v1");
}

#[tokio::test]
async fn test_missing_token_on_refresh_is_not_fatal() {
    let source = StaticSource::new("v1", "a\\.com\n");
    let cache = AllowlistCache::initialize(&source).await.unwrap();
    let refresher = Refresher::new(source.clone(), cache.clone());

    source.drop_token();
    let err = refresher.refresh_cycle().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RefreshCycleFailure);
    assert_eq!(cache.version().as_str(), "v1");

    source.publish("v2", "b\\.com\n");
    let outcome = refresher.refresh_cycle().await.unwrap();
    assert!(matches!(outcome, RefreshOutcome::Updated { patterns: 1, .. }));
    assert!(matcher::matches("b.com", &cache.current()));
}

#[tokio::test(start_paused = true)]
async fn test_refresher_keeps_polling_after_failures() {
    let source = StaticSource::new("v1", "a\\.com\n");
    let cache = AllowlistCache::initialize(&source).await.unwrap();
    let (stop, stop_rx) = tokio::sync::watch::channel(false);

    let handle = Refresher::new(source.clone(), cache.clone())
        .with_interval(Duration::from_secs(300))
        .spawn(stop_rx);

    source.publish("v2", "b\\.com\n");
    source.declare_length(1);
    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(cache.version().as_str(), "v1");

    source.publish("v3", "c\\.com\n");
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(cache.version().as_str(), "v3");

    stop.send(true).unwrap();
    handle.await.unwrap();
}
