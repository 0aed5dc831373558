//! Core types for the consolidator

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate key: one balance row per (merchant, date)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BalanceKey {
    /// Balance date (from the entry's own timestamp, not consumption time)
    pub date: NaiveDate,

    /// Merchant
    pub merchant_id: String,
}

impl BalanceKey {
    /// Storage key: ISO date prefix then merchant id, so one date's rows are
    /// contiguous and merchant-ordered under an ascending scan
    pub fn encode(&self) -> Vec<u8> {
        let mut key = self.date.format("%Y-%m-%d").to_string().into_bytes();
        key.push(b'|');
        key.extend_from_slice(self.merchant_id.as_bytes());
        key
    }

    /// Scan prefix for all rows of one date
    pub fn date_prefix(date: NaiveDate) -> Vec<u8> {
        let mut prefix = date.format("%Y-%m-%d").to_string().into_bytes();
        prefix.push(b'|');
        prefix
    }
}

/// Consolidated daily balance of one merchant
///
/// Doubles as the merge operand: an operand is a row whose total is the
/// delta to accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBalance {
    /// Merchant
    pub merchant_id: String,

    /// Balance date
    pub date: NaiveDate,

    /// Signed total of all consumed entries for this key
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,

    /// Last accumulation timestamp
    pub updated_at: DateTime<Utc>,
}

/// Balance row as served to readers and the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBalanceView {
    /// Merchant
    pub merchant_id: String,

    /// Balance date
    pub date: NaiveDate,

    /// Signed total
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
}

impl From<DailyBalance> for DailyBalanceView {
    fn from(balance: DailyBalance) -> Self {
        Self {
            merchant_id: balance.merchant_id,
            date: balance.date,
            total_amount: balance.total_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_encoding_groups_by_date() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        let key = BalanceKey {
            date,
            merchant_id: "m1".to_string(),
        };

        let encoded = key.encode();
        assert!(encoded.starts_with(&BalanceKey::date_prefix(date)));
        assert_eq!(encoded, b"2026-08-26|m1".to_vec());
    }

    #[test]
    fn test_key_encoding_orders_merchants() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        let a = BalanceKey {
            date,
            merchant_id: "alpha".to_string(),
        }
        .encode();
        let b = BalanceKey {
            date,
            merchant_id: "beta".to_string(),
        }
        .encode();
        assert!(a < b);
    }
}
