//! Fluxo Ledger
//!
//! Write-optimized ledger of immutable merchant entries with a transactional
//! outbox.
//!
//! # Architecture
//!
//! - **Append-only**: entries are never modified or deleted
//! - **Transactional outbox**: every entry commits together with the domain
//!   event describing it, in one storage batch — no dual-write window
//! - **Background publisher**: a perpetual loop drains unprocessed outbox
//!   records to the bus, at-least-once
//!
//! # Invariants
//!
//! - Every entry has exactly one outbox record from the same atomic write
//! - An outbox record goes unprocessed → processed exactly once, only after
//!   a successful publish
//! - A publish failure is never fatal: the record stays unprocessed and is
//!   retried on the next cycle

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod command;
pub mod config;
pub mod error;
pub mod metrics;
pub mod outbox;
pub mod storage;
pub mod types;

// Re-exports
pub use command::{CommandHandler, CreateEntry};
pub use config::Config;
pub use error::{Error, Result};
pub use outbox::{OutboxConfig, OutboxPublisher};
pub use storage::Storage;
pub use types::{EntryType, LedgerEntry, OutboxRecord};
