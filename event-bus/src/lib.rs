//! Event bus for the Fluxo services
//!
//! Carries `EntryRecorded` events from the ledger service to the
//! consolidator with at-least-once delivery:
//! - Closed event-kind registry (tag → codec, no reflective lookup)
//! - NATS JetStream transport with explicit ack / nak redelivery
//! - In-process bus for wiring services together in tests
//! - Retry logic with exponential backoff
//! - Observability via Prometheus metrics

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod error;
pub mod events;
pub mod memory;
pub mod message;
pub mod metrics;
pub mod publisher;
pub mod subscriber;

pub use client::{NatsClient, NatsConfig};
pub use error::{Error, Result};
pub use events::{DomainEvent, EntryRecorded, EntryType, EventKind};
pub use memory::MemoryBus;
pub use message::Message;
pub use publisher::{EventBus, NatsBus, Publisher, PublisherConfig};
pub use subscriber::{MessageHandler, Subscriber, SubscriberConfig};
