//! Ledger service binary
//!
//! Opens the store and runs the outbox publisher until Ctrl-C. The HTTP
//! command/query surface lives behind an external gateway and is out of
//! scope here.

use event_bus::{NatsBus, NatsClient, NatsConfig, Publisher, PublisherConfig};
use ledger::{Config, OutboxConfig, OutboxPublisher, Storage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Fluxo ledger service");

    let config = Config::from_env()?;
    let storage = Arc::new(Storage::open(&config)?);

    let client = Arc::new(NatsClient::new(NatsConfig {
        url: config.nats_url.clone(),
    }));
    let bus = Arc::new(NatsBus::new(client));
    bus.ensure_streams().await?;

    let publisher = Publisher::new(bus, PublisherConfig::default());
    let worker = OutboxPublisher::new(
        storage,
        publisher,
        OutboxConfig {
            batch_size: config.outbox.batch_size,
            poll_interval: Duration::from_millis(config.outbox.poll_interval_ms),
        },
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_task = tokio::spawn(async move { worker.run(shutdown_rx).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down ledger service");

    let _ = shutdown_tx.send(true);
    worker_task.await?;

    Ok(())
}
