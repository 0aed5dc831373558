//! Configuration for the consolidator service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Consolidator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// NATS server URL
    pub nats_url: String,

    /// Cache configuration
    pub cache: CacheSettings,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/consolidator"),
            service_name: "consolidator".to_string(),
            nats_url: "nats://localhost:4222".to_string(),
            cache: CacheSettings::default(),
            rocksdb: RocksDbConfig::default(),
        }
    }
}

/// Balance cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Snapshot time-to-live (seconds)
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
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

        if let Ok(data_dir) = std::env::var("CONSOLIDATOR_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(url) = std::env::var("CONSOLIDATOR_NATS_URL") {
            config.nats_url = url;
        }

        if let Ok(ttl) = std::env::var("CONSOLIDATOR_CACHE_TTL_SECS") {
            config.cache.ttl_secs = ttl
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid cache TTL: {}", e)))?;
        }

        Ok(config)
    }
}
