use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set or empty")]
    MissingEnv(&'static str),

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure of a single relay operation. Contained by the scheduler.
#[derive(Debug, Error)]
pub enum RelayError {
    /// GET from the source failed; nothing was sent to the destination.
    #[error("GET failed for {source_url}: {reason}")]
    Upstream { source_url: String, reason: String },

    #[error("PUT failed for {destination}: {reason}")]
    Downstream { destination: String, reason: String },

    #[error("relay {source_url} -> {destination} timed out after {after:?}")]
    Timeout {
        source_url: String,
        destination: String,
        after: Duration,
    },
}

/// Errors from the programmatic push client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),

    #[error("PUT failed for {endpoint}: {reason}")]
    Http { endpoint: String, reason: String },

    #[error("push to {endpoint} timed out after {after:?}")]
    Timeout { endpoint: String, after: Duration },
}

/// Receiver listener failures.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("{listener} listener failed: {source}")]
    Serve {
        listener: &'static str,
        #[source]
        source: std::io::Error,
    },
}
