use std::net::SocketAddr;
use std::path::Path;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable holding the receiver's expected bearer token.
pub const BEARER_TOKEN_ENV: &str = "BEARER_TOKEN";

const EXAMPLE_TOKEN_LEN: usize = 22;

// ─── Receiver ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Token pushes must present as `Authorization: Bearer <token>`.
    pub expected_bearer_token: String,
    /// Listener for authenticated `PUT`s.
    pub auth_addr: SocketAddr,
    /// Listener for public `GET`s.
    pub public_addr: SocketAddr,
}

impl ReceiverConfig {
    /// Reads the token from `BEARER_TOKEN`; addresses come from the caller.
    pub fn from_env(auth_addr: SocketAddr, public_addr: SocketAddr) -> Result<Self, ConfigError> {
        let token = std::env::var(BEARER_TOKEN_ENV).unwrap_or_default();
        Self::new(token, auth_addr, public_addr)
    }

    pub fn new(
        expected_bearer_token: impl Into<String>,
        auth_addr: SocketAddr,
        public_addr: SocketAddr,
    ) -> Result<Self, ConfigError> {
        let expected_bearer_token = expected_bearer_token.into();
        if expected_bearer_token.is_empty() {
            return Err(ConfigError::MissingEnv(BEARER_TOKEN_ENV));
        }
        Ok(Self {
            expected_bearer_token,
            auth_addr,
            public_addr,
        })
    }
}

// ─── Sender ──────────────────────────────────────────────────────

/// One relay directive: scrape `source`, push to `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pair {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SenderConfig {
    /// Shared secret attached to every outbound `PUT`.
    pub bearer_token: String,
    #[serde(default)]
    pub pairs: Vec<Pair>,
}

impl SenderConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: SenderConfig =
            serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
                path: "<inline>".into(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bearer_token.is_empty() {
            return Err(ConfigError::Invalid("bearer_token must not be empty".into()));
        }
        for (i, pair) in self.pairs.iter().enumerate() {
            if pair.source.is_empty() || pair.destination.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "pairs[{i}]: source and destination are required"
                )));
            }
        }
        if self.pairs.is_empty() {
            tracing::warn!("sender config has no pairs; nothing will be relayed");
        }
        Ok(())
    }

    /// A filled-in config with a fresh random token, for `sender exampleconfig`.
    pub fn example() -> Self {
        Self {
            bearer_token: random_token(),
            pairs: vec![Pair {
                source: "http://192.168.1.100:9090/metrics".into(),
                destination: "http://promremotereceiver.example.com/metrics/fooproject/192.168.1.100"
                    .into(),
            }],
        }
    }

    pub fn to_pretty_json(&self) -> String {
        // Plain strings and vectors only; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(EXAMPLE_TOKEN_LEN)
        .map(char::from)
        .collect()
}
