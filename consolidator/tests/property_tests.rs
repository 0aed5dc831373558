//! Property-based tests for balance accumulation invariants
//!
//! - Order independence: any delivery order of the same deltas yields the
//!   same final total
//! - Duplicate suppression: replaying every event changes nothing
//! - Conservation: the final total is exactly the sum of applied deltas

use chrono::{NaiveDate, Utc};
use consolidator::{BalanceKey, BalanceStore, Config};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

fn test_store() -> (BalanceStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    (BalanceStore::open(&config).unwrap(), temp_dir)
}

fn balance_key() -> BalanceKey {
    BalanceKey {
        date: NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(),
        merchant_id: "m1".to_string(),
    }
}

/// Signed deltas in cents, both credits and debits
fn deltas_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-1_000_000i64..1_000_000i64, 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_total_is_order_independent(deltas in deltas_strategy()) {
        let key = balance_key();
        let events: Vec<(Uuid, i64)> =
            deltas.iter().map(|&cents| (Uuid::now_v7(), cents)).collect();

        let (forward, _dir_a) = test_store();
        for (id, cents) in &events {
            forward.apply(*id, &key, Decimal::new(*cents, 2), Utc::now()).unwrap();
        }

        let (reverse, _dir_b) = test_store();
        for (id, cents) in events.iter().rev() {
            reverse.apply(*id, &key, Decimal::new(*cents, 2), Utc::now()).unwrap();
        }

        let expected = Decimal::new(deltas.iter().sum::<i64>(), 2);
        prop_assert_eq!(forward.balance(&key).unwrap().unwrap().total_amount, expected);
        prop_assert_eq!(reverse.balance(&key).unwrap().unwrap().total_amount, expected);
    }

    #[test]
    fn prop_redelivery_changes_nothing(deltas in deltas_strategy()) {
        let key = balance_key();
        let events: Vec<(Uuid, i64)> =
            deltas.iter().map(|&cents| (Uuid::now_v7(), cents)).collect();

        let (store, _dir) = test_store();
        for (id, cents) in &events {
            store.apply(*id, &key, Decimal::new(*cents, 2), Utc::now()).unwrap();
        }
        let before = store.balance(&key).unwrap().unwrap().total_amount;

        // Replay the full stream
        for (id, cents) in &events {
            store.apply(*id, &key, Decimal::new(*cents, 2), Utc::now()).unwrap();
        }

        let after = store.balance(&key).unwrap().unwrap().total_amount;
        prop_assert_eq!(before, after);
        prop_assert_eq!(after, Decimal::new(deltas.iter().sum::<i64>(), 2));
    }
}
