//! TTL cache in front of the balance store (cache-aside)
//!
//! Never authoritative: populated only on a read miss, invalidated only by
//! the consumer after its store write commits. A stale snapshot therefore
//! lives at most one TTL. The clock is injectable so expiry is testable
//! without sleeping.

use crate::types::DailyBalanceView;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Time source seam
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CacheSlot {
    value: Vec<DailyBalanceView>,
    expires_at: DateTime<Utc>,
}

/// Date-keyed balance snapshot cache
pub struct BalanceCache {
    slots: DashMap<String, CacheSlot>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl BalanceCache {
    /// Create cache with the given TTL and the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create cache with an injected clock
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
            clock,
        }
    }

    fn key(date: NaiveDate) -> String {
        format!("daily-balances:{}", date.format("%Y-%m-%d"))
    }

    /// Cached snapshot for a date, if present and unexpired
    pub fn get(&self, date: NaiveDate) -> Option<Vec<DailyBalanceView>> {
        let key = Self::key(date);
        let now = self.clock.now();

        if let Some(slot) = self.slots.get(&key) {
            if slot.expires_at > now {
                return Some(slot.value.clone());
            }
        }

        // Expired slots are dropped lazily on access
        self.slots.remove_if(&key, |_, slot| slot.expires_at <= now);
        None
    }

    /// Store a snapshot for a date with the fixed TTL
    pub fn put(&self, date: NaiveDate, value: Vec<DailyBalanceView>) {
        let expires_at = self.clock.now() + self.ttl;
        self.slots
            .insert(Self::key(date), CacheSlot { value, expires_at });
    }

    /// Drop the snapshot for a date
    pub fn invalidate(&self, date: NaiveDate) {
        self.slots.remove(&Self::key(date));
        tracing::debug!(date = %date, "Balance cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(start),
            }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn view(merchant: &str, date: NaiveDate) -> DailyBalanceView {
        DailyBalanceView {
            merchant_id: merchant.to_string(),
            date,
            total_amount: Decimal::new(10000, 2),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 26).unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let cache = BalanceCache::new(Duration::minutes(5));
        cache.put(date(), vec![view("m1", date())]);

        let hit = cache.get(date()).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].merchant_id, "m1");
    }

    #[test]
    fn test_miss_on_other_date() {
        let cache = BalanceCache::new(Duration::minutes(5));
        cache.put(date(), vec![view("m1", date())]);

        let other = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        assert!(cache.get(other).is_none());
    }

    #[test]
    fn test_expiry_via_clock() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = BalanceCache::with_clock(Duration::minutes(5), clock.clone());

        cache.put(date(), vec![view("m1", date())]);
        assert!(cache.get(date()).is_some());

        clock.advance(Duration::minutes(5));
        assert!(cache.get(date()).is_none());
    }

    #[test]
    fn test_invalidate_drops_snapshot() {
        let cache = BalanceCache::new(Duration::minutes(5));
        cache.put(date(), vec![view("m1", date())]);

        cache.invalidate(date());
        assert!(cache.get(date()).is_none());
    }
}
