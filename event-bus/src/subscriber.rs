//! Message subscriber with durable JetStream consumers

use crate::{
    client::NatsClient,
    message::Message,
    metrics::{MESSAGE_PROCESS_DURATION, MESSAGE_RECEIVE_TOTAL},
    Error, EventKind, Result,
};
use async_nats::jetstream::{self, consumer};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{error, info};

/// Message handler trait
///
/// A returned error nacks the message so the broker redelivers it; handlers
/// must therefore be idempotent.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle incoming message
    async fn handle(&self, message: Message) -> Result<()>;
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Durable consumer name
    pub durable_name: String,

    /// Acknowledgment wait time before redelivery
    pub ack_wait: Duration,

    /// Max delivery attempts
    pub max_deliver: i64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            durable_name: "fluxo-consolidator".to_string(),
            ack_wait: Duration::from_secs(30),
            max_deliver: 10,
        }
    }
}

/// JetStream subscriber for one event kind
pub struct Subscriber {
    client: Arc<NatsClient>,
    config: SubscriberConfig,
    kind: EventKind,
}

impl Subscriber {
    /// Create new subscriber
    pub fn new(client: Arc<NatsClient>, config: SubscriberConfig, kind: EventKind) -> Self {
        Self {
            client,
            config,
            kind,
        }
    }

    /// Subscribe and process messages until the shutdown signal fires
    ///
    /// Handler success acks the message; handler failure nacks it for
    /// redelivery; an unparseable envelope is terminated so it cannot poison
    /// the consumer.
    pub async fn run<H>(&self, handler: Arc<H>, mut shutdown: watch::Receiver<bool>) -> Result<()>
    where
        H: MessageHandler + 'static,
    {
        let js = self.client.jetstream().await?;
        let stream_name = self.kind.stream_name();
        let subject = self.kind.subject().to_string();

        info!(
            "Subscribing to stream {} (consumer: {})",
            stream_name, self.config.durable_name
        );

        self.client
            .get_or_create_stream(stream_name, vec![subject.clone()])
            .await?;

        let consumer_config = consumer::pull::Config {
            durable_name: Some(self.config.durable_name.clone()),
            filter_subject: subject,
            ack_policy: consumer::AckPolicy::Explicit,
            ack_wait: self.config.ack_wait,
            max_deliver: self.config.max_deliver,
            deliver_policy: consumer::DeliverPolicy::All,
            ..Default::default()
        };

        let consumer = js
            .get_stream(stream_name)
            .await
            .map_err(|e| Error::JetStream(e.to_string()))?
            .create_consumer(consumer_config)
            .await
            .map_err(|e| Error::JetStream(e.to_string()))?;

        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| Error::Subscribe(e.to_string()))?;

        loop {
            let msg = tokio::select! {
                next = messages.next() => match next {
                    Some(msg) => msg.map_err(|e| Error::Subscribe(e.to_string()))?,
                    None => break,
                },
                _ = shutdown.changed() => {
                    info!("Subscriber for {} stopping", self.kind);
                    break;
                }
            };

            match Message::from_bytes(&msg.payload) {
                Ok(message) => {
                    let start = Instant::now();

                    MESSAGE_RECEIVE_TOTAL
                        .with_label_values(&[self.kind.tag(), "success"])
                        .inc();

                    match handler.handle(message.clone()).await {
                        Ok(_) => {
                            if let Err(e) = msg.ack().await {
                                error!("Failed to ack message {}: {}", message.id, e);
                            }

                            let duration = start.elapsed().as_secs_f64();
                            MESSAGE_PROCESS_DURATION
                                .with_label_values(&[self.kind.tag()])
                                .observe(duration);
                        }
                        Err(e) => {
                            error!("Error handling message {}: {}", message.id, e);

                            // Nak so the broker redelivers
                            if let Err(nak_err) = msg.ack_with(jetstream::AckKind::Nak(None)).await
                            {
                                error!("Failed to nak message {}: {}", message.id, nak_err);
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to parse message: {}", e);

                    MESSAGE_RECEIVE_TOTAL
                        .with_label_values(&[self.kind.tag(), "parse_error"])
                        .inc();

                    // Terminate bad envelope (won't be redelivered)
                    if let Err(term_err) = msg.ack_with(jetstream::AckKind::Term).await {
                        error!("Failed to terminate bad message: {}", term_err);
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::NatsConfig;

    #[test]
    fn test_subscriber_config_default() {
        let config = SubscriberConfig::default();
        assert_eq!(config.durable_name, "fluxo-consolidator");
        assert_eq!(config.max_deliver, 10);
    }

    #[tokio::test]
    async fn test_subscriber_creation() {
        let client = Arc::new(NatsClient::new(NatsConfig::default()));
        let subscriber = Subscriber::new(
            client,
            SubscriberConfig::default(),
            EventKind::EntryRecorded,
        );
        assert_eq!(subscriber.kind, EventKind::EntryRecorded);
    }
}
