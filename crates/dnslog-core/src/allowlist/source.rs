//! Remote allowlist source
//!
//! The source exposes a validation token (`ETag`) that changes whenever the
//! list changes, so the refresher can poll cheaply and download only on change.

use super::snapshot::{AllowlistSnapshot, ValidationToken};
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, ETAG};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A downloaded allowlist body with the metadata needed to verify it
#[derive(Debug, Clone)]
pub struct FetchedAllowlist {
    /// Token of the downloaded content
    pub token: ValidationToken,
    /// Length the source declared for the body
    pub declared_length: u64,
    /// Raw body
    pub body: Vec<u8>,
}

impl FetchedAllowlist {
    /// Check the body is complete
    pub fn verify(&self) -> Result<()> {
        let actual = self.body.len() as u64;
        if actual != self.declared_length {
            return Err(Error::LengthMismatch {
                expected: self.declared_length,
                actual,
            });
        }
        Ok(())
    }

    /// Verify, then parse into a snapshot tagged with this token
    pub fn into_snapshot(self) -> Result<AllowlistSnapshot> {
        self.verify()?;
        let body = String::from_utf8_lossy(&self.body);
        Ok(AllowlistSnapshot::from_body(self.token, &body))
    }
}

/// Where allowlist versions come from
pub trait AllowlistSource: Send + Sync {
    /// Current validation token, without downloading the body
    fn probe(&self) -> impl Future<Output = Result<ValidationToken>> + Send;

    /// Download the full list
    fn fetch(&self) -> impl Future<Output = Result<FetchedAllowlist>> + Send;
}

/// HTTP(S) allowlist source
#[derive(Debug, Clone)]
pub struct HttpAllowlistSource {
    client: reqwest::Client,
    uri: String,
    timeout: Duration,
}

impl HttpAllowlistSource {
    /// Create a source for `uri`; every request is bounded by `timeout`
    pub fn new(uri: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dnslog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            uri: uri.into(),
            timeout,
        })
    }

    /// Configured URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            Error::Http(err)
        }
    }

    fn check_status(&self, response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                uri: self.uri.clone(),
            });
        }
        Ok(())
    }
}

fn validation_token(headers: &HeaderMap) -> Result<ValidationToken> {
    headers
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ValidationToken::new)
        .ok_or(Error::MissingValidationToken)
}

fn declared_length(headers: &HeaderMap) -> Result<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .ok_or(Error::MissingContentLength)
}

impl AllowlistSource for HttpAllowlistSource {
    async fn probe(&self) -> Result<ValidationToken> {
        let response = self
            .client
            .head(&self.uri)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.check_status(&response)?;

        let token = validation_token(response.headers())?;
        debug!(uri = %self.uri, token = %token, "Probed allowlist");
        Ok(token)
    }

    async fn fetch(&self) -> Result<FetchedAllowlist> {
        let response = self
            .client
            .get(&self.uri)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.check_status(&response)?;

        let token = validation_token(response.headers())?;
        let declared_length = declared_length(response.headers())?;
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?
            .to_vec();

        debug!(uri = %self.uri, token = %token, bytes = body.len(), "Downloaded allowlist");
        Ok(FetchedAllowlist {
            token,
            declared_length,
            body,
        })
    }
}
