//! Consolidator service binary
//!
//! Opens the balance store, subscribes to `EntryRecorded`, and serves the
//! consumer until Ctrl-C. The HTTP query surface lives behind an external
//! gateway and is out of scope here.

use consolidator::{
    BalanceCache, BalanceReader, BalanceStore, Config, EntryRecordedConsumer, SystemClock,
};
use event_bus::{EventKind, NatsClient, NatsConfig, Subscriber, SubscriberConfig};
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Fluxo consolidator service");

    let config = Config::from_env()?;
    let store = Arc::new(BalanceStore::open(&config)?);
    let cache = Arc::new(BalanceCache::new(chrono::Duration::seconds(
        config.cache.ttl_secs as i64,
    )));

    // Reader is handed to the HTTP layer in deployment; constructing it here
    // keeps the wiring honest.
    let _reader = BalanceReader::new(store.clone(), cache.clone(), Arc::new(SystemClock));

    let consumer = Arc::new(EntryRecordedConsumer::new(store, cache));

    let client = Arc::new(NatsClient::new(NatsConfig {
        url: config.nats_url.clone(),
    }));
    let subscriber = Subscriber::new(
        client,
        SubscriberConfig::default(),
        EventKind::EntryRecorded,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let subscriber_task = tokio::spawn(async move {
        if let Err(e) = subscriber.run(consumer, shutdown_rx).await {
            tracing::error!(error = %e, "Subscriber terminated");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down consolidator service");

    let _ = shutdown_tx.send(true);
    subscriber_task.await?;

    Ok(())
}
