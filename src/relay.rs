use std::time::Duration;

use reqwest::header;

use crate::config::Pair;
use crate::error::RelayError;
use crate::PROM_CONTENT_TYPE;

/// Deadline shared by the GET and the PUT of one relay operation.
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Pulls a snapshot from a source and pushes it to a receiver.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Relay {
    http: reqwest::Client,
    timeout: Duration,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl Relay {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: DEFAULT_RELAY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GETs `pair.source`, then PUTs the body to `pair.destination`.
    ///
    /// One deadline covers both requests, so a slow source eats into the time
    /// left for the PUT. The PUT is only attempted after the GET body has been
    /// read completely.
    pub async fn relay(&self, pair: &Pair, bearer_token: &str) -> Result<(), RelayError> {
        match tokio::time::timeout(self.timeout, self.relay_inner(pair, bearer_token)).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::Timeout {
                source_url: pair.source.clone(),
                destination: pair.destination.clone(),
                after: self.timeout,
            }),
        }
    }

    async fn relay_inner(&self, pair: &Pair, bearer_token: &str) -> Result<(), RelayError> {
        let upstream = |reason: String| RelayError::Upstream {
            source_url: pair.source.clone(),
            reason,
        };
        let downstream = |reason: String| RelayError::Downstream {
            destination: pair.destination.clone(),
            reason,
        };

        let body = self
            .http
            .get(&pair.source)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| upstream(describe(&e)))?
            .bytes()
            .await
            .map_err(|e| upstream(describe(&e)))?;

        let size = body.len();
        self.http
            .put(&pair.destination)
            .bearer_auth(bearer_token)
            .header(header::CONTENT_TYPE, PROM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| downstream(describe(&e)))?;

        tracing::debug!(
            source = %pair.source,
            destination = %pair.destination,
            bytes = size,
            "relayed snapshot"
        );
        Ok(())
    }
}

/// Flattens a reqwest error into one line, including HTTP status when present.
pub(crate) fn describe(err: &reqwest::Error) -> String {
    match err.status() {
        Some(status) => format!("HTTP status {status}"),
        None => {
            let mut msg = err.to_string();
            let mut cause = std::error::Error::source(err);
            while let Some(inner) = cause {
                msg.push_str(": ");
                msg.push_str(&inner.to_string());
                cause = inner.source();
            }
            msg
        }
    }
}
