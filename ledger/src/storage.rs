//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `entries` - Append-only entry log (key: entry_id)
//! - `outbox` - Outbox records (key: created_at_nanos || record_id)
//! - `outbox_pending` - Pending index (same key, empty value); deleted when
//!   a record is marked processed, so the publisher scans only unprocessed
//!   records in creation order
//!
//! The composite outbox key makes an ascending scan oldest-first, which
//! bounds staleness without any cross-merchant ordering guarantee.

use crate::{
    error::{Error, Result},
    types::{LedgerEntry, OutboxRecord},
    Config,
};
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use uuid::Uuid;

/// Column family names
const CF_ENTRIES: &str = "entries";
const CF_OUTBOX: &str = "outbox";
const CF_OUTBOX_PENDING: &str = "outbox_pending";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ENTRIES, Self::cf_options_entries()),
            ColumnFamilyDescriptor::new(CF_OUTBOX, Self::cf_options_outbox()),
            ColumnFamilyDescriptor::new(CF_OUTBOX_PENDING, Self::cf_options_outbox()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened ledger RocksDB at {:?}", path);

        Ok(Self { db })
    }

    fn cf_options_entries() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_outbox() -> Options {
        let mut opts = Options::default();
        // Outbox rows are short-lived and frequently scanned
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// Composite outbox key: creation time then record id
    fn outbox_key(created_at: DateTime<Utc>, id: Uuid) -> [u8; 24] {
        let mut key = [0u8; 24];
        let nanos = created_at.timestamp_nanos_opt().unwrap_or(0);
        key[..8].copy_from_slice(&nanos.to_be_bytes());
        key[8..].copy_from_slice(id.as_bytes());
        key
    }

    // Entry + outbox operations

    /// Persist entry and outbox record atomically
    ///
    /// Both land or neither does: there is no state where an entry exists
    /// without its pending event, or an event without its entry.
    pub fn append_entry_with_outbox(
        &self,
        entry: &LedgerEntry,
        record: &OutboxRecord,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_entries = self.cf_handle(CF_ENTRIES)?;
        batch.put_cf(cf_entries, entry.id.as_bytes(), bincode::serialize(entry)?);

        let cf_outbox = self.cf_handle(CF_OUTBOX)?;
        let key = Self::outbox_key(record.created_at, record.id);
        batch.put_cf(cf_outbox, key, bincode::serialize(record)?);

        let cf_pending = self.cf_handle(CF_OUTBOX_PENDING)?;
        batch.put_cf(cf_pending, key, b"");

        self.db.write(batch)?;

        tracing::debug!(
            entry_id = %entry.id,
            merchant_id = %entry.merchant_id,
            "Entry appended with outbox record"
        );

        Ok(())
    }

    /// Get entry by ID
    pub fn entry(&self, id: Uuid) -> Result<Option<LedgerEntry>> {
        let cf = self.cf_handle(CF_ENTRIES)?;

        match self.db.get_cf(cf, id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    // Outbox operations

    /// Unprocessed outbox records, oldest first, bounded by `limit`
    pub fn unprocessed_outbox(&self, limit: usize) -> Result<Vec<OutboxRecord>> {
        let cf_pending = self.cf_handle(CF_OUTBOX_PENDING)?;
        let cf_outbox = self.cf_handle(CF_OUTBOX)?;

        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf_pending, IteratorMode::Start) {
            if records.len() >= limit {
                break;
            }
            let (key, _) = item?;

            match self.db.get_cf(cf_outbox, &key)? {
                Some(value) => records.push(bincode::deserialize(&value)?),
                None => {
                    // Dangling index entry; should not happen since both are
                    // written in one batch
                    tracing::warn!("Pending index without outbox record, skipping");
                }
            }
        }

        Ok(records)
    }

    /// Mark a batch of records processed, in one atomic write
    pub fn mark_processed(
        &self,
        records: &[OutboxRecord],
        processed_at: DateTime<Utc>,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let cf_outbox = self.cf_handle(CF_OUTBOX)?;
        let cf_pending = self.cf_handle(CF_OUTBOX_PENDING)?;

        let mut batch = WriteBatch::default();
        for record in records {
            let key = Self::outbox_key(record.created_at, record.id);

            let mut processed = record.clone();
            processed.processed_at = Some(processed_at);

            batch.put_cf(cf_outbox, key, bincode::serialize(&processed)?);
            batch.delete_cf(cf_pending, key);
        }

        self.db.write(batch)?;
        Ok(())
    }

    /// Number of records still awaiting publication
    pub fn pending_outbox_count(&self) -> Result<u64> {
        let cf = self.cf_handle(CF_OUTBOX_PENDING)?;

        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// All outbox records in creation order (processed included)
    pub fn outbox_records(&self) -> Result<Vec<OutboxRecord>> {
        let cf = self.cf_handle(CF_OUTBOX)?;

        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            records.push(bincode::deserialize(&value)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryType;
    use event_bus::DomainEvent;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    fn entry_with_outbox(merchant: &str, cents: i64) -> (LedgerEntry, OutboxRecord) {
        let entry = LedgerEntry::new(merchant, Decimal::new(cents, 2), EntryType::Credit);
        let event = DomainEvent::EntryRecorded(entry.recorded_event());
        let record = OutboxRecord::for_event(&event).unwrap();
        (entry, record)
    }

    #[test]
    fn test_append_is_atomic_pair() {
        let (storage, _temp) = test_storage();
        let (entry, record) = entry_with_outbox("m1", 10000);

        storage.append_entry_with_outbox(&entry, &record).unwrap();

        // Entry, outbox record, and pending index all observable together
        assert_eq!(storage.entry(entry.id).unwrap().unwrap(), entry);
        let pending = storage.unprocessed_outbox(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, record.id);
        assert_eq!(storage.pending_outbox_count().unwrap(), 1);
    }

    #[test]
    fn test_entry_missing_returns_none() {
        let (storage, _temp) = test_storage();
        assert!(storage.entry(Uuid::now_v7()).unwrap().is_none());
    }

    #[test]
    fn test_unprocessed_oldest_first_and_bounded() {
        let (storage, _temp) = test_storage();

        let mut ids = Vec::new();
        for i in 0..5 {
            let (entry, mut record) = entry_with_outbox("m1", 100 + i);
            // Force strictly increasing creation times
            record.created_at = Utc::now() + chrono::Duration::milliseconds(i);
            storage.append_entry_with_outbox(&entry, &record).unwrap();
            ids.push(record.id);
        }

        let batch = storage.unprocessed_outbox(3).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch.iter().map(|r| r.id).collect::<Vec<_>>(),
            ids[..3].to_vec()
        );
    }

    #[test]
    fn test_mark_processed_removes_from_pending() {
        let (storage, _temp) = test_storage();
        let (entry, record) = entry_with_outbox("m1", 10000);
        storage.append_entry_with_outbox(&entry, &record).unwrap();

        let processed_at = Utc::now();
        storage.mark_processed(&[record.clone()], processed_at).unwrap();

        assert!(storage.unprocessed_outbox(10).unwrap().is_empty());
        assert_eq!(storage.pending_outbox_count().unwrap(), 0);

        // Record survives with processed_at set
        let all = storage.outbox_records().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, record.id);
        assert!(all[0].processed_at.is_some());
    }

    #[test]
    fn test_mark_processed_empty_batch_is_noop() {
        let (storage, _temp) = test_storage();
        storage.mark_processed(&[], Utc::now()).unwrap();
    }
}
