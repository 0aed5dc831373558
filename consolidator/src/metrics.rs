//! Prometheus metrics for the consolidator service

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    /// Events consumed, by outcome (merged/duplicate)
    pub static ref EVENTS_CONSUMED_TOTAL: CounterVec = register_counter_vec!(
        "consolidator_events_consumed_total",
        "Total EntryRecorded events consumed",
        &["outcome"]
    )
    .unwrap();

    /// Balance cache lookups, by result (hit/miss)
    pub static ref CACHE_LOOKUP_TOTAL: CounterVec = register_counter_vec!(
        "consolidator_cache_lookup_total",
        "Balance cache lookups",
        &["result"]
    )
    .unwrap();
}
