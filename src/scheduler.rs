use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::SenderConfig;
use crate::relay::Relay;

/// Period between fan-out rounds.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(4);

/// Outcome of one fan-out round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Relays every configured pair once per interval.
pub struct Scheduler {
    config: Arc<SenderConfig>,
    relay: Relay,
    interval: Duration,
}

impl Scheduler {
    pub fn new(config: Arc<SenderConfig>, relay: Relay) -> Self {
        Self {
            config,
            relay,
            interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs rounds until `shutdown` is cancelled.
    ///
    /// Shutdown is only observed between rounds: a round that has started runs
    /// to completion. A round that overruns the interval delays the next one
    /// instead of overlapping it.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.interval,
            self.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            pairs = self.config.pairs.len(),
            interval_ms = self.interval.as_millis() as u64,
            "sender started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("sender stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One round: relay all pairs in parallel and wait for every result.
    ///
    /// Failures are logged individually and never stop sibling pairs.
    pub async fn tick(&self) -> TickReport {
        let start = Instant::now();
        let mut tasks = JoinSet::new();

        for pair in &self.config.pairs {
            let relay = self.relay.clone();
            let config = self.config.clone();
            let pair = pair.clone();
            tasks.spawn(async move {
                let result = relay.relay(&pair, &config.bearer_token).await;
                (pair, result)
            });
        }

        let mut report = TickReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.succeeded += 1,
                Ok((pair, Err(e))) => {
                    report.failed += 1;
                    tracing::warn!(
                        source = %pair.source,
                        destination = %pair.destination,
                        error = %e,
                        "relay failed"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(error = %e, "relay task panicked");
                }
            }
        }

        tracing::debug!(
            succeeded = report.succeeded,
            failed = report.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "tick complete"
        );
        report
    }
}
