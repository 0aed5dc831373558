//! `EntryRecorded` consumer
//!
//! Invoked once per delivered message. The balance date comes from the
//! event's own timestamp, never consumption time, so late deliveries land on
//! the day the entry was recorded. The store merge commits before the cache
//! invalidation is issued, and invalidation runs unconditionally — even for
//! a duplicate, the snapshot for that date may predate the first delivery.

use crate::{
    cache::BalanceCache,
    metrics::EVENTS_CONSUMED_TOTAL,
    store::{Applied, BalanceStore},
    types::BalanceKey,
};
use async_trait::async_trait;
use chrono::Utc;
use event_bus::{EntryRecorded, EventKind, Message, MessageHandler};
use std::sync::Arc;
use tracing::{info, warn};

/// Balance consumer: idempotent signed-delta upsert plus cache invalidation
pub struct EntryRecordedConsumer {
    store: Arc<BalanceStore>,
    cache: Arc<BalanceCache>,
}

impl EntryRecordedConsumer {
    /// Create new consumer
    pub fn new(store: Arc<BalanceStore>, cache: Arc<BalanceCache>) -> Self {
        Self { store, cache }
    }
}

#[async_trait]
impl MessageHandler for EntryRecordedConsumer {
    async fn handle(&self, message: Message) -> event_bus::Result<()> {
        if message.kind != EventKind::EntryRecorded {
            warn!(kind = %message.kind, "Unexpected event kind, ignoring");
            return Ok(());
        }

        let event: EntryRecorded = serde_json::from_value(message.payload.clone())?;

        let key = BalanceKey {
            date: event.created_at.date_naive(),
            merchant_id: event.merchant_id.clone(),
        };
        let delta = event.signed_amount();

        // Any store failure propagates so the message is nacked and
        // redelivered; the dedupe ledger keeps the redelivery harmless.
        let applied = self
            .store
            .apply(event.entry_id, &key, delta, Utc::now())
            .map_err(|e| event_bus::Error::Handler(e.to_string()))?;

        match applied {
            Applied::Merged => {
                EVENTS_CONSUMED_TOTAL.with_label_values(&["merged"]).inc();
                info!(
                    entry_id = %event.entry_id,
                    merchant_id = %event.merchant_id,
                    date = %key.date,
                    delta = %delta,
                    "Balance updated"
                );
            }
            Applied::Duplicate => {
                EVENTS_CONSUMED_TOTAL
                    .with_label_values(&["duplicate"])
                    .inc();
                info!(
                    entry_id = %event.entry_id,
                    "Duplicate delivery, balance unchanged"
                );
            }
        }

        self.cache.invalidate(key.date);

        Ok(())
    }
}
