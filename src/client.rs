//! Push client for programs that own a [`prometheus::Registry`] and want to
//! push it to a receiver directly, without running a sender.
//!
//! ```no_run
//! # async fn example() -> Result<(), prompipe::ClientError> {
//! let registry = prometheus::Registry::new();
//! let client = prompipe::client::PushClient::new(
//!     "http://receiver.example.com/metrics/batch/host1",
//!     "s3cret",
//! );
//! client.send(&registry).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use prometheus::{Encoder, Registry, TextEncoder};
use reqwest::header;

use crate::error::ClientError;
use crate::relay::{describe, DEFAULT_RELAY_TIMEOUT};
use crate::PROM_CONTENT_TYPE;

pub struct PushClient {
    endpoint: String,
    bearer_token: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl PushClient {
    pub fn new(endpoint: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bearer_token: bearer_token.into(),
            http: reqwest::Client::new(),
            timeout: DEFAULT_RELAY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Gathers `registry` and PUTs it in text exposition format.
    pub async fn send(&self, registry: &Registry) -> Result<(), ClientError> {
        let body = gather_to_text(registry)?;

        let request = self
            .http
            .put(&self.endpoint)
            .bearer_auth(&self.bearer_token)
            .header(header::CONTENT_TYPE, PROM_CONTENT_TYPE)
            .body(body)
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ClientError::Timeout {
                endpoint: self.endpoint.clone(),
                after: self.timeout,
            })?;

        response
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| ClientError::Http {
                endpoint: self.endpoint.clone(),
                reason: describe(&e),
            })?;
        Ok(())
    }
}

/// Encodes every metric family in `registry` as Prometheus text.
pub fn gather_to_text(registry: &Registry) -> Result<Vec<u8>, ClientError> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    Ok(buf)
}
