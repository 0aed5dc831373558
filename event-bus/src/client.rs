//! NATS client with lazy connection and JetStream access

use crate::{Error, Result};
use async_nats::jetstream::{
    self,
    stream::{Config as StreamConfig, RetentionPolicy, StorageType},
};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

/// NATS connection configuration
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
        }
    }
}

/// NATS client wrapper
///
/// Connects lazily on first use so services can be constructed before the
/// broker is reachable.
pub struct NatsClient {
    config: NatsConfig,
    client: OnceCell<async_nats::Client>,
}

impl NatsClient {
    /// Create new client (does not connect yet)
    pub fn new(config: NatsConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Get the underlying connection, connecting on first call
    pub async fn client(&self) -> Result<async_nats::Client> {
        let client = self
            .client
            .get_or_try_init(|| async {
                info!("Connecting to NATS at {}", self.config.url);
                async_nats::connect(&self.config.url)
                    .await
                    .map_err(|e| Error::Connection(e.to_string()))
            })
            .await?;

        Ok(client.clone())
    }

    /// Get a JetStream context
    pub async fn jetstream(&self) -> Result<jetstream::Context> {
        Ok(jetstream::new(self.client().await?))
    }

    /// Ensure a stream exists for the given subjects
    pub async fn get_or_create_stream(&self, name: &str, subjects: Vec<String>) -> Result<()> {
        let js = self.jetstream().await?;

        let config = StreamConfig {
            name: name.to_string(),
            subjects,
            retention: RetentionPolicy::Limits,
            max_age: Duration::from_secs(7 * 24 * 3600),
            storage: StorageType::File,
            ..Default::default()
        };

        js.get_or_create_stream(config)
            .await
            .map_err(|e| Error::JetStream(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NatsConfig::default();
        assert_eq!(config.url, "nats://localhost:4222");
    }

    #[tokio::test]
    async fn test_client_is_lazy() {
        // Construction never touches the network
        let client = NatsClient::new(NatsConfig::default());
        assert!(client.client.get().is_none());
    }
}
