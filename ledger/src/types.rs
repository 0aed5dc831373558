//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode at rest)
//! - Exact arithmetic (Decimal for money)
//! - Immutability: an entry is never updated after its atomic write

use chrono::{DateTime, Utc};
use event_bus::{DomainEvent, EntryRecorded};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use event_bus::EntryType;

/// A debit or credit recorded by a merchant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Merchant that owns the entry
    pub merchant_id: String,

    /// Entry amount (always positive)
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,

    /// Credit or Debit
    pub entry_type: EntryType,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create new entry with a generated ID and the current timestamp
    pub fn new(merchant_id: impl Into<String>, amount: Decimal, entry_type: EntryType) -> Self {
        Self {
            id: Uuid::now_v7(),
            merchant_id: merchant_id.into(),
            amount,
            entry_type,
            created_at: Utc::now(),
        }
    }

    /// Signed amount: credits increment the balance, debits decrement
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Credit => self.amount,
            EntryType::Debit => -self.amount,
        }
    }

    /// Domain event describing this entry
    pub fn recorded_event(&self) -> EntryRecorded {
        EntryRecorded {
            entry_id: self.id,
            merchant_id: self.merchant_id.clone(),
            amount: self.amount,
            entry_type: self.entry_type,
            created_at: self.created_at,
        }
    }
}

/// A pending domain event awaiting publication (outbox pattern)
///
/// Created atomically with its triggering entry; mutated only by the
/// publisher, which sets `processed_at` after a successful publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxRecord {
    /// Unique record ID
    pub id: Uuid,

    /// Event kind tag (resolved through the closed registry at publish time)
    pub event_tag: String,

    /// Serialized event payload
    pub payload: Vec<u8>,

    /// Creation timestamp (publish order within a batch)
    pub created_at: DateTime<Utc>,

    /// Set exactly once, after a successful publish
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxRecord {
    /// Build the outbox record for a domain event
    pub fn for_event(event: &DomainEvent) -> event_bus::Result<Self> {
        Ok(Self {
            id: Uuid::now_v7(),
            event_tag: event.kind().tag().to_string(),
            payload: event.encode()?,
            created_at: Utc::now(),
            processed_at: None,
        })
    }
}
