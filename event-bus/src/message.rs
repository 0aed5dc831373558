//! Message envelope for pub/sub

use crate::events::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message ID (UUIDv7 for ordering)
    pub id: Uuid,

    /// Event kind
    pub kind: EventKind,

    /// Payload (JSON-serialized event)
    pub payload: serde_json::Value,

    /// Publish timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create new message
    pub fn new(kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// NATS subject for this message
    pub fn subject(&self) -> String {
        self.kind.subject().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let msg = Message::new(EventKind::EntryRecorded, json!({"amount": "100.00"}));

        assert_eq!(msg.kind, EventKind::EntryRecorded);
        assert_eq!(msg.payload["amount"], "100.00");
    }

    #[test]
    fn test_message_subject() {
        let msg = Message::new(EventKind::EntryRecorded, json!({}));
        assert_eq!(msg.subject(), "fluxo.ledger.entry.recorded");
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::new(EventKind::EntryRecorded, json!({"test": "data"}));

        let bytes = msg.to_bytes().unwrap();
        let deserialized = Message::from_bytes(&bytes).unwrap();

        assert_eq!(msg.id, deserialized.id);
        assert_eq!(msg.kind, deserialized.kind);
        assert_eq!(msg.payload, deserialized.payload);
    }
}
