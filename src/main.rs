use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use prompipe::relay::Relay;
use prompipe::scheduler::Scheduler;
use prompipe::{install, lifecycle, logging, server};
use prompipe::{ReceiverConfig, SenderConfig, SnapshotStore};

/// Prometheus pipe
#[derive(Parser, Debug)]
#[command(name = "prompipe", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Starts the receiver (token from the BEARER_TOKEN environment variable)
    Receiver {
        /// Listen address for authenticated pushes
        #[arg(long, default_value = "0.0.0.0:80")]
        auth_addr: SocketAddr,

        /// Listen address for public scrapes
        #[arg(long, default_value = "0.0.0.0:9090")]
        public_addr: SocketAddr,
    },

    /// Starts the sender
    Sender {
        /// Path to the sender's JSON config
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Seconds between relay rounds
        #[arg(long, default_value_t = 4)]
        interval_secs: u64,

        #[command(subcommand)]
        action: Option<SenderAction>,
    },
}

#[derive(Subcommand, Debug)]
enum SenderAction {
    /// Installs a systemd unit file so the sender starts on boot
    Install,
    /// Prints an example config file
    Exampleconfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command {
        Command::Receiver {
            auth_addr,
            public_addr,
        } => run_receiver(auth_addr, public_addr).await,
        Command::Sender {
            action: Some(SenderAction::Install),
            ..
        } => install::install_sender_service().map(|hints| println!("{hints}")),
        Command::Sender {
            action: Some(SenderAction::Exampleconfig),
            ..
        } => {
            println!("{}", SenderConfig::example().to_pretty_json());
            Ok(())
        }
        Command::Sender {
            config,
            interval_secs,
            action: None,
        } => run_sender(config, interval_secs).await,
    };

    if let Err(e) = &result {
        tracing::error!("exiting: {e:#}");
    }
    result
}

async fn run_receiver(auth_addr: SocketAddr, public_addr: SocketAddr) -> anyhow::Result<()> {
    let config = ReceiverConfig::from_env(auth_addr, public_addr)?;
    let store = Arc::new(SnapshotStore::new());
    let shutdown = lifecycle::shutdown_on_signal();

    server::run_receiver(&config, store, shutdown).await?;
    Ok(())
}

async fn run_sender(config_path: PathBuf, interval_secs: u64) -> anyhow::Result<()> {
    anyhow::ensure!(interval_secs > 0, "--interval-secs must be at least 1");

    let config = SenderConfig::load(&config_path)
        .with_context(|| format!("loading sender config {}", config_path.display()))?;
    let shutdown = lifecycle::shutdown_on_signal();

    Scheduler::new(Arc::new(config), Relay::default())
        .with_interval(Duration::from_secs(interval_secs))
        .run(shutdown)
        .await;
    Ok(())
}
