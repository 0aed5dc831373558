//! Entry command handling
//!
//! Validates input, persists the entry and its outbox record as one atomic
//! unit, and returns the new entry id. No broker interaction here: the
//! outbox worker picks the event up asynchronously.

use crate::{
    error::{Error, Result},
    metrics::ENTRIES_RECORDED_TOTAL,
    types::{EntryType, LedgerEntry, OutboxRecord},
    Storage,
};
use event_bus::DomainEvent;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Command to record a merchant entry
#[derive(Debug, Clone)]
pub struct CreateEntry {
    /// Merchant recording the entry
    pub merchant_id: String,

    /// Entry amount, must be positive
    pub amount: Decimal,

    /// "Credit" or "Debit", case-insensitive
    pub entry_type: String,
}

/// Entry command handler
pub struct CommandHandler {
    storage: Arc<Storage>,
}

impl CommandHandler {
    /// Create new handler
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Record an entry
    ///
    /// On success both the entry and its outbox record are durable; on any
    /// failure neither is.
    pub fn create_entry(&self, command: CreateEntry) -> Result<Uuid> {
        if command.merchant_id.trim().is_empty() {
            return Err(Error::Validation("merchant_id is required".to_string()));
        }
        if command.amount <= Decimal::ZERO {
            return Err(Error::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        let entry_type = EntryType::parse(&command.entry_type).ok_or_else(|| {
            Error::Validation(format!("unknown entry type: {}", command.entry_type))
        })?;

        let entry = LedgerEntry::new(command.merchant_id, command.amount, entry_type);
        let event = DomainEvent::EntryRecorded(entry.recorded_event());
        let record = OutboxRecord::for_event(&event)?;

        self.storage.append_entry_with_outbox(&entry, &record)?;

        ENTRIES_RECORDED_TOTAL
            .with_label_values(&[entry_type.as_str()])
            .inc();

        tracing::info!(
            entry_id = %entry.id,
            merchant_id = %entry.merchant_id,
            amount = %entry.amount,
            entry_type = %entry.entry_type,
            "Entry recorded"
        );

        Ok(entry.id)
    }

    /// Look up an entry by id
    pub fn entry(&self, id: Uuid) -> Result<Option<LedgerEntry>> {
        self.storage.entry(id)
    }
}
