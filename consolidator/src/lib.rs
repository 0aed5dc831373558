//! Fluxo Consolidator
//!
//! Read-optimized daily balance aggregate fed by `EntryRecorded` events.
//!
//! # Architecture
//!
//! - **Atomic merge**: balances accumulate through a RocksDB merge operator,
//!   never read-then-write, so concurrent deliveries to the same
//!   (merchant, date) key serialize inside the store
//! - **Applied-event ledger**: each entry id is recorded in the same batch
//!   as its merge, making at-least-once redelivery harmless
//! - **Cache-aside**: a TTL cache in front of the store, populated only on
//!   read miss and invalidated only by the consumer
//!
//! # Invariants
//!
//! - Exactly one balance row per (merchant, date)
//! - A given entry moves the total exactly once, regardless of redeliveries
//! - The cache is advisory: a stale snapshot lives at most one TTL

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod cache;
pub mod config;
pub mod consumer;
pub mod error;
pub mod metrics;
pub mod read;
pub mod store;
pub mod types;

// Re-exports
pub use cache::{BalanceCache, Clock, SystemClock};
pub use config::Config;
pub use consumer::EntryRecordedConsumer;
pub use error::{Error, Result};
pub use read::BalanceReader;
pub use store::{Applied, BalanceStore};
pub use types::{BalanceKey, DailyBalance, DailyBalanceView};
