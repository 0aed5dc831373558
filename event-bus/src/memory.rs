//! In-process bus for wiring services together without a broker
//!
//! Delivery is synchronous with publish: a publish only succeeds once every
//! attached handler has accepted the message. A handler failure surfaces as
//! a publish error, so an outbox worker publishing through this bus leaves
//! the record unprocessed and redelivers on its next cycle — the same
//! at-least-once shape the JetStream transport provides.

use crate::{publisher::EventBus, Error, Message, MessageHandler, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, RwLock};

/// In-process event bus
#[derive(Default)]
pub struct MemoryBus {
    handlers: RwLock<Vec<Arc<dyn MessageHandler>>>,
    published: Mutex<Vec<Message>>,
}

impl MemoryBus {
    /// Create new empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler; it receives every subsequently published message
    pub fn attach(&self, handler: Arc<dyn MessageHandler>) {
        self.handlers
            .write()
            .expect("handler lock poisoned")
            .push(handler);
    }

    /// Number of successfully delivered messages
    pub fn published_count(&self) -> usize {
        self.published.lock().expect("publish log poisoned").len()
    }

    /// Snapshot of delivered messages, in publish order
    pub fn published(&self) -> Vec<Message> {
        self.published.lock().expect("publish log poisoned").clone()
    }
}

#[async_trait]
impl EventBus for MemoryBus {
    async fn publish(&self, message: &Message) -> Result<()> {
        // Wire round-trip keeps handlers honest about the envelope format
        let delivered = Message::from_bytes(&message.to_bytes()?)?;

        let handlers: Vec<Arc<dyn MessageHandler>> = self
            .handlers
            .read()
            .expect("handler lock poisoned")
            .clone();

        for handler in handlers {
            handler
                .handle(delivered.clone())
                .await
                .map_err(|e| Error::Publish(e.to_string()))?;
        }

        self.published
            .lock()
            .expect("publish log poisoned")
            .push(delivered);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl MessageHandler for Counting {
        async fn handle(&self, _message: Message) -> Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Rejecting;

    #[async_trait]
    impl MessageHandler for Rejecting {
        async fn handle(&self, _message: Message) -> Result<()> {
            Err(Error::Handler("no".to_string()))
        }
    }

    #[tokio::test]
    async fn test_delivers_to_handlers() {
        let bus = MemoryBus::new();
        let handler = Arc::new(Counting {
            seen: AtomicUsize::new(0),
        });
        bus.attach(handler.clone());

        let msg = Message::new(EventKind::EntryRecorded, json!({}));
        bus.publish(&msg).await.unwrap();
        bus.publish(&msg).await.unwrap();

        assert_eq!(handler.seen.load(Ordering::SeqCst), 2);
        assert_eq!(bus.published_count(), 2);
    }

    #[tokio::test]
    async fn test_handler_failure_fails_publish() {
        let bus = MemoryBus::new();
        bus.attach(Arc::new(Rejecting));

        let msg = Message::new(EventKind::EntryRecorded, json!({}));
        assert!(bus.publish(&msg).await.is_err());
        assert_eq!(bus.published_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_without_handlers_succeeds() {
        let bus = MemoryBus::new();
        let msg = Message::new(EventKind::EntryRecorded, json!({}));
        bus.publish(&msg).await.unwrap();
        assert_eq!(bus.published_count(), 1);
    }
}
