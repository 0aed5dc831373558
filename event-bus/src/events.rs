//! Domain event contract and the closed event-kind registry
//!
//! Every payload crossing the bus is described by an [`EventKind`] tag.
//! Outbox records store the tag as a string; [`EventKind::from_tag`] is the
//! only way back, so an unknown tag is detected at dispatch time instead of
//! producing an undecodable message on the wire.

use crate::{Error, Message, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Event kind (closed registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A ledger entry was durably recorded
    EntryRecorded,
}

impl EventKind {
    /// Stable tag stored in outbox records
    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::EntryRecorded => "ledger.entry.recorded",
        }
    }

    /// Resolve a stored tag back to a kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ledger.entry.recorded" => Some(EventKind::EntryRecorded),
            _ => None,
        }
    }

    /// NATS subject for this kind
    pub fn subject(&self) -> &'static str {
        match self {
            EventKind::EntryRecorded => "fluxo.ledger.entry.recorded",
        }
    }

    /// JetStream stream name for this kind
    pub fn stream_name(&self) -> &'static str {
        match self {
            EventKind::EntryRecorded => "LEDGER_ENTRIES",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Entry type: credit increments the daily balance, debit decrements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Credit entry (positive signed amount)
    Credit,
    /// Debit entry (negative signed amount)
    Debit,
}

impl EntryType {
    /// Parse from string, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("credit") {
            Some(EntryType::Credit)
        } else if s.eq_ignore_ascii_case("debit") {
            Some(EntryType::Debit)
        } else {
            None
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Credit => "Credit",
            EntryType::Debit => "Debit",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event published when a ledger entry is recorded
///
/// The sole wire schema between the ledger and the consolidator. New fields
/// must be added with `#[serde(default)]` to stay backward compatible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecorded {
    /// Ledger entry ID (doubles as the consumer-side dedupe key)
    pub entry_id: Uuid,

    /// Merchant that recorded the entry
    pub merchant_id: String,

    /// Entry amount (always positive)
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,

    /// Credit or Debit
    pub entry_type: EntryType,

    /// When the entry was recorded (drives the balance date)
    pub created_at: DateTime<Utc>,
}

impl EntryRecorded {
    /// Signed amount: +amount for Credit, -amount for Debit
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Credit => self.amount,
            EntryType::Debit => -self.amount,
        }
    }
}

/// Decoded domain event (tagged-variant dispatch over [`EventKind`])
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// `ledger.entry.recorded`
    EntryRecorded(EntryRecorded),
}

impl DomainEvent {
    /// Kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::EntryRecorded(_) => EventKind::EntryRecorded,
        }
    }

    /// Encode the payload for outbox storage
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            DomainEvent::EntryRecorded(event) => Ok(serde_json::to_vec(event)?),
        }
    }

    /// Decode a stored payload for the given kind
    pub fn decode(kind: EventKind, payload: &[u8]) -> Result<Self> {
        match kind {
            EventKind::EntryRecorded => {
                Ok(DomainEvent::EntryRecorded(serde_json::from_slice(payload)?))
            }
        }
    }

    /// Wrap into a bus message envelope
    pub fn to_message(&self) -> Result<Message> {
        let payload = match self {
            DomainEvent::EntryRecorded(event) => serde_json::to_value(event)?,
        };
        Ok(Message::new(self.kind(), payload))
    }
}
