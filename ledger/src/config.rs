//! Configuration for the ledger service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// NATS server URL
    pub nats_url: String,

    /// Outbox worker configuration
    pub outbox: OutboxSettings,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/ledger"),
            service_name: "ledger".to_string(),
            nats_url: "nats://localhost:4222".to_string(),
            outbox: OutboxSettings::default(),
            rocksdb: RocksDbConfig::default(),
        }
    }
}

/// Outbox worker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxSettings {
    /// Max records per publish cycle
    pub batch_size: usize,

    /// Sleep between cycles (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for OutboxSettings {
    fn default() -> Self {
        Self {
            batch_size: 20,
            poll_interval_ms: 5_000,
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 4,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load defaults with environment variable overrides
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(url) = std::env::var("LEDGER_NATS_URL") {
            config.nats_url = url;
        }

        if let Ok(interval) = std::env::var("LEDGER_OUTBOX_POLL_INTERVAL_MS") {
            config.outbox.poll_interval_ms = interval
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid poll interval: {}", e)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "ledger");
        assert_eq!(config.outbox.batch_size, 20);
        assert_eq!(config.outbox.poll_interval_ms, 5_000);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.outbox.batch_size, config.outbox.batch_size);
    }
}
