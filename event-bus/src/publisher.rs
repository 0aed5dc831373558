//! Message publisher with retry logic

use crate::{
    client::NatsClient,
    message::Message,
    metrics::{MESSAGE_PUBLISH_DURATION, MESSAGE_PUBLISH_TOTAL},
    Error, EventKind, Result,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Transport seam for publishing messages
///
/// The outbox worker publishes through this trait; production wires in
/// [`NatsBus`], tests wire in [`crate::MemoryBus`].
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish one message; an error means the message must be retried
    async fn publish(&self, message: &Message) -> Result<()>;
}

/// JetStream-backed bus
pub struct NatsBus {
    client: Arc<NatsClient>,
}

impl NatsBus {
    /// Create new bus over an existing client
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self { client }
    }

    /// Ensure the streams for all registered event kinds exist
    pub async fn ensure_streams(&self) -> Result<()> {
        let kind = EventKind::EntryRecorded;
        self.client
            .get_or_create_stream(kind.stream_name(), vec![kind.subject().to_string()])
            .await
    }
}

#[async_trait]
impl EventBus for NatsBus {
    async fn publish(&self, message: &Message) -> Result<()> {
        let js = self.client.jetstream().await?;
        let payload = message.to_bytes()?;

        // Publish and wait for the JetStream acknowledgment; only an acked
        // publish counts as delivered.
        let ack = js
            .publish(message.subject(), bytes::Bytes::from(payload))
            .await
            .map_err(|e| Error::Publish(e.to_string()))?;

        ack.await
            .map_err(|e| Error::JetStream(format!("Publish ack failed: {}", e)))?;

        Ok(())
    }
}

/// Publisher configuration
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Max retry attempts per publish call
    pub max_retry_attempts: u32,

    /// Initial retry delay
    pub initial_retry_delay: Duration,

    /// Max retry delay
    pub max_retry_delay: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            initial_retry_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_secs(2),
        }
    }
}

/// Message publisher with exponential backoff
pub struct Publisher {
    bus: Arc<dyn EventBus>,
    config: PublisherConfig,
}

impl Publisher {
    /// Create new publisher
    pub fn new(bus: Arc<dyn EventBus>, config: PublisherConfig) -> Self {
        Self { bus, config }
    }

    /// Publish message
    pub async fn publish(&self, message: &Message) -> Result<()> {
        let start = Instant::now();

        let result = self.publish_with_retry(message).await;

        let duration = start.elapsed().as_secs_f64();
        MESSAGE_PUBLISH_DURATION
            .with_label_values(&[message.kind.tag()])
            .observe(duration);

        let status = if result.is_ok() { "success" } else { "error" };
        MESSAGE_PUBLISH_TOTAL
            .with_label_values(&[message.kind.tag(), status])
            .inc();

        result
    }

    /// Publish with exponential backoff retry
    async fn publish_with_retry(&self, message: &Message) -> Result<()> {
        let mut attempts = 0;
        let mut delay = self.config.initial_retry_delay;

        loop {
            attempts += 1;

            match self.bus.publish(message).await {
                Ok(_) => {
                    if attempts > 1 {
                        info!("Message {} published after {} attempts", message.id, attempts);
                    }
                    return Ok(());
                }
                Err(e) => {
                    if attempts >= self.config.max_retry_attempts {
                        error!(
                            "Failed to publish {} after {} attempts: {}",
                            message.id, attempts, e
                        );
                        return Err(e);
                    }

                    warn!(
                        "Publish of {} failed (attempt {}), retrying in {:?}: {}",
                        message.id, attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;

                    delay = (delay * 2).min(self.config.max_retry_delay);
                }
            }
        }
    }
}
