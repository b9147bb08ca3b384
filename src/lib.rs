//! Prometheus pipe.
//!
//! A **sender** periodically pulls text-format metrics from local endpoints and
//! pushes them, bearer-authenticated, to a central **receiver**. The receiver keeps
//! the latest snapshot per `(job, instance)` in memory and re-serves it on a
//! separate, unauthenticated port for the collector to scrape.

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod install;
pub mod lifecycle;
pub mod logging;
pub mod middleware;
pub mod relay;
pub mod scheduler;
pub mod server;
pub mod store;

use std::sync::Arc;

pub use config::{Pair, ReceiverConfig, SenderConfig};
pub use error::{ClientError, ConfigError, RelayError, ServeError};
pub use store::{SnapshotKey, SnapshotStore};

/// Content type of the Prometheus text exposition format, version 0.0.4.
pub const PROM_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Receiver state shared by both listeners via `State<Arc<AppState>>`.
pub struct AppState {
    /// One store instance, written by the ingress port and read by the public port.
    pub store: Arc<SnapshotStore>,

    /// Pushes must carry exactly `Bearer <expected_bearer_token>`.
    pub expected_bearer_token: String,
}

impl AppState {
    pub fn new(store: Arc<SnapshotStore>, expected_bearer_token: impl Into<String>) -> Self {
        Self {
            store,
            expected_bearer_token: expected_bearer_token.into(),
        }
    }
}
