//! Outbox publisher worker
//!
//! Perpetual background loop draining unprocessed outbox records to the bus.
//! Each cycle publishes a bounded batch oldest-first, then flags the
//! successfully published records in one atomic write. Anything that fails
//! stays unprocessed and is retried next cycle; the loop itself never dies
//! on a cycle error. Restarts are safe: a record published but not yet
//! flagged is simply published again — consumers deduplicate.

use crate::{
    metrics::{OUTBOX_PENDING, OUTBOX_PUBLISHED_TOTAL, OUTBOX_SKIPPED_TOTAL},
    Result, Storage,
};
use chrono::Utc;
use event_bus::{DomainEvent, EventKind, Publisher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Outbox worker configuration
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Max records per cycle
    pub batch_size: usize,

    /// Sleep between cycles
    pub poll_interval: Duration,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Background publisher for the outbox table
pub struct OutboxPublisher {
    storage: Arc<Storage>,
    publisher: Publisher,
    config: OutboxConfig,
}

impl OutboxPublisher {
    /// Create new worker
    pub fn new(storage: Arc<Storage>, publisher: Publisher, config: OutboxConfig) -> Self {
        Self {
            storage,
            publisher,
            config,
        }
    }

    /// One poll/publish/flag pass; returns the number of records flagged
    ///
    /// Public so tests and operational tooling can drive the worker one
    /// cycle at a time.
    pub async fn run_cycle(&self) -> Result<usize> {
        let records = self.storage.unprocessed_outbox(self.config.batch_size)?;
        if records.is_empty() {
            return Ok(0);
        }

        let mut published = Vec::new();
        for record in records {
            let kind = match EventKind::from_tag(&record.event_tag) {
                Some(kind) => kind,
                None => {
                    // Data-integrity alarm, not a transient fault: the record
                    // is left for manual remediation and skipped every cycle.
                    warn!(
                        record_id = %record.id,
                        event_tag = %record.event_tag,
                        "Unknown outbox event tag, skipping record"
                    );
                    OUTBOX_SKIPPED_TOTAL.inc();
                    continue;
                }
            };

            let message = match DomainEvent::decode(kind, &record.payload)
                .and_then(|event| event.to_message())
            {
                Ok(message) => message,
                Err(e) => {
                    warn!(
                        record_id = %record.id,
                        error = %e,
                        "Undecodable outbox payload, skipping record"
                    );
                    OUTBOX_SKIPPED_TOTAL.inc();
                    continue;
                }
            };

            match self.publisher.publish(&message).await {
                Ok(()) => published.push(record),
                Err(e) => {
                    // Stays unprocessed; retried next cycle
                    error!(
                        record_id = %record.id,
                        error = %e,
                        "Failed to publish outbox record"
                    );
                }
            }
        }

        // Flag the whole batch together, only after the publishes succeeded
        self.storage.mark_processed(&published, Utc::now())?;

        OUTBOX_PUBLISHED_TOTAL.inc_by(published.len() as u64);
        OUTBOX_PENDING.set(self.storage.pending_outbox_count()? as i64);

        Ok(published.len())
    }

    /// Run until the shutdown signal fires
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Outbox publisher started"
        );

        loop {
            match self.run_cycle().await {
                Ok(count) if count > 0 => {
                    info!(published = count, "Outbox cycle complete");
                }
                Ok(_) => {}
                Err(e) => {
                    // Never fatal to the loop
                    error!(error = %e, "Outbox cycle failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = shutdown.changed() => {
                    info!("Outbox publisher stopping");
                    break;
                }
            }
        }
    }
}
