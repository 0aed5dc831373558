//! Balance storage using RocksDB
//!
//! # Column Families
//!
//! - `balances` - One row per (merchant, date), accumulated through an
//!   associative merge operator (insert-or-add in a single store-level
//!   operation)
//! - `applied_events` - Entry ids already folded into a balance; written in
//!   the same batch as the merge, this is the dedupe ledger that makes
//!   at-least-once redelivery harmless

use crate::{
    error::{Error, Result},
    types::{BalanceKey, DailyBalance},
    Config,
};
use chrono::{DateTime, NaiveDate, Utc};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, MergeOperands, Options,
    WriteBatch, DB,
};
use uuid::Uuid;

/// Column family names
const CF_BALANCES: &str = "balances";
const CF_APPLIED: &str = "applied_events";

/// Outcome of applying one event's delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Delta merged into the balance row
    Merged,
    /// Entry id already applied; balance unchanged
    Duplicate,
}

/// Associative merge: existing row plus delta operands
///
/// Value and operand share the `DailyBalance` encoding; an operand carries
/// the delta in `total_amount`. An undecodable operand is dropped rather
/// than poisoning the row.
fn accumulate_balance(
    _key: &[u8],
    existing: Option<&[u8]>,
    operands: &MergeOperands,
) -> Option<Vec<u8>> {
    let mut current: Option<DailyBalance> =
        existing.and_then(|bytes| bincode::deserialize(bytes).ok());

    for operand in operands {
        let delta: DailyBalance = match bincode::deserialize(operand) {
            Ok(delta) => delta,
            Err(_) => continue,
        };

        current = Some(match current.take() {
            None => delta,
            Some(mut row) => {
                row.total_amount += delta.total_amount;
                if delta.updated_at > row.updated_at {
                    row.updated_at = delta.updated_at;
                }
                row
            }
        });
    }

    current.and_then(|row| bincode::serialize(&row).ok())
}

/// Storage wrapper for the balance aggregate
pub struct BalanceStore {
    db: DB,
}

impl BalanceStore {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        let mut balance_opts = Options::default();
        balance_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        balance_opts.set_merge_operator_associative("daily_balance_accumulate", accumulate_balance);

        let mut applied_opts = Options::default();
        applied_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_BALANCES, balance_opts),
            ColumnFamilyDescriptor::new(CF_APPLIED, applied_opts),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened consolidator RocksDB at {:?}", path);

        Ok(Self { db })
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// Has this entry already been folded into a balance?
    pub fn is_applied(&self, entry_id: Uuid) -> Result<bool> {
        let cf = self.cf_handle(CF_APPLIED)?;
        Ok(self.db.get_cf(cf, entry_id.as_bytes())?.is_some())
    }

    /// Apply one event's signed delta to its balance row
    ///
    /// Insert-or-accumulate runs as a store-level merge, and the applied
    /// marker lands in the same atomic batch; a redelivered entry id is a
    /// no-op reported as [`Applied::Duplicate`].
    pub fn apply(
        &self,
        entry_id: Uuid,
        key: &BalanceKey,
        delta: rust_decimal::Decimal,
        now: DateTime<Utc>,
    ) -> Result<Applied> {
        if self.is_applied(entry_id)? {
            return Ok(Applied::Duplicate);
        }

        let operand = DailyBalance {
            merchant_id: key.merchant_id.clone(),
            date: key.date,
            total_amount: delta,
            updated_at: now,
        };

        let cf_balances = self.cf_handle(CF_BALANCES)?;
        let cf_applied = self.cf_handle(CF_APPLIED)?;

        let mut batch = WriteBatch::default();
        batch.merge_cf(cf_balances, key.encode(), bincode::serialize(&operand)?);
        batch.put_cf(
            cf_applied,
            entry_id.as_bytes(),
            now.timestamp_nanos_opt().unwrap_or(0).to_be_bytes(),
        );

        self.db.write(batch)?;

        Ok(Applied::Merged)
    }

    /// Balance row for one key
    pub fn balance(&self, key: &BalanceKey) -> Result<Option<DailyBalance>> {
        let cf = self.cf_handle(CF_BALANCES)?;

        match self.db.get_cf(cf, key.encode())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// All balance rows for one date, merchant-ordered
    pub fn balances_for(&self, date: NaiveDate) -> Result<Vec<DailyBalance>> {
        let cf = self.cf_handle(CF_BALANCES)?;
        let prefix = BalanceKey::date_prefix(date);

        let mut rows = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            rows.push(bincode::deserialize(&value)?);
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_store() -> (Arc<BalanceStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Arc::new(BalanceStore::open(&config).unwrap()), temp_dir)
    }

    fn key(merchant: &str, day: u32) -> BalanceKey {
        BalanceKey {
            date: NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
            merchant_id: merchant.to_string(),
        }
    }

    #[test]
    fn test_merge_inserts_then_accumulates() {
        let (store, _temp) = test_store();
        let key = key("m1", 26);

        store
            .apply(Uuid::now_v7(), &key, Decimal::new(10000, 2), Utc::now())
            .unwrap();
        store
            .apply(Uuid::now_v7(), &key, Decimal::new(-3000, 2), Utc::now())
            .unwrap();

        let row = store.balance(&key).unwrap().unwrap();
        assert_eq!(row.total_amount, Decimal::new(7000, 2));
        assert_eq!(row.merchant_id, "m1");
    }

    #[test]
    fn test_duplicate_entry_id_applies_once() {
        let (store, _temp) = test_store();
        let key = key("m1", 26);
        let entry_id = Uuid::now_v7();

        let first = store
            .apply(entry_id, &key, Decimal::new(10000, 2), Utc::now())
            .unwrap();
        let second = store
            .apply(entry_id, &key, Decimal::new(10000, 2), Utc::now())
            .unwrap();

        assert_eq!(first, Applied::Merged);
        assert_eq!(second, Applied::Duplicate);
        assert!(store.is_applied(entry_id).unwrap());

        let row = store.balance(&key).unwrap().unwrap();
        assert_eq!(row.total_amount, Decimal::new(10000, 2));
    }

    #[test]
    fn test_concurrent_same_key_merges_converge() {
        let (store, _temp) = test_store();
        let key = key("m1", 26);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                let key = key.clone();
                std::thread::spawn(move || {
                    store
                        .apply(Uuid::now_v7(), &key, Decimal::new(5000, 2), Utc::now())
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Applied::Merged);
        }

        // One row, never two, with both deltas accumulated
        let rows = store.balances_for(key.date).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_amount, Decimal::new(10000, 2));
    }

    #[test]
    fn test_balances_for_filters_and_orders() {
        let (store, _temp) = test_store();

        store
            .apply(Uuid::now_v7(), &key("beta", 26), Decimal::ONE, Utc::now())
            .unwrap();
        store
            .apply(Uuid::now_v7(), &key("alpha", 26), Decimal::TWO, Utc::now())
            .unwrap();
        store
            .apply(Uuid::now_v7(), &key("other", 27), Decimal::TEN, Utc::now())
            .unwrap();

        let rows = store
            .balances_for(NaiveDate::from_ymd_opt(2026, 8, 26).unwrap())
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].merchant_id, "alpha");
        assert_eq!(rows[1].merchant_id, "beta");
    }

    #[test]
    fn test_empty_date_yields_no_rows() {
        let (store, _temp) = test_store();
        let rows = store
            .balances_for(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .unwrap();
        assert!(rows.is_empty());
    }
}
