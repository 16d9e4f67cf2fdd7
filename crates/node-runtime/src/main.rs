//! # MessageBox Relay
//!
//! Entry point: load configuration, build the node, sign the host
//! advertisement and run until interrupted. Log verbosity comes from
//! `MB_LOG_LEVEL` (default `info`).

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::{MessageBoxNode, NodeConfig};

const LOG_LEVEL_ENV: &str = "MB_LOG_LEVEL";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = NodeConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let node = MessageBoxNode::new(config).context("Failed to initialize subsystems")?;

    let signed = node.advertise().context("Failed to sign host advertisement")?;
    info!(
        identity_key = %node.identity_key(),
        host = %signed.advertisement.host,
        locking_script = %hex::encode(&signed.locking_script),
        "host advertisement ready for broadcast"
    );

    info!("MessageBox relay is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    Ok(())
}
