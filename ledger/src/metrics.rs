//! Prometheus metrics for the ledger service

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, IntCounter,
    IntGauge,
};

lazy_static! {
    /// Entries recorded, by type
    pub static ref ENTRIES_RECORDED_TOTAL: CounterVec = register_counter_vec!(
        "ledger_entries_recorded_total",
        "Total entries recorded",
        &["entry_type"]
    )
    .unwrap();

    /// Outbox records published and flagged
    pub static ref OUTBOX_PUBLISHED_TOTAL: IntCounter = register_int_counter!(
        "ledger_outbox_published_total",
        "Total outbox records published and marked processed"
    )
    .unwrap();

    /// Outbox records skipped on unknown tag or undecodable payload
    pub static ref OUTBOX_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        "ledger_outbox_skipped_total",
        "Total outbox records skipped (unknown tag or corrupt payload)"
    )
    .unwrap();

    /// Outbox records awaiting publication
    pub static ref OUTBOX_PENDING: IntGauge = register_int_gauge!(
        "ledger_outbox_pending",
        "Outbox records awaiting publication"
    )
    .unwrap();
}
