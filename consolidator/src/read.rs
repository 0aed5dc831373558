//! Balance read path (cache-aside)

use crate::{
    cache::{BalanceCache, Clock},
    metrics::CACHE_LOOKUP_TOTAL,
    store::BalanceStore,
    types::DailyBalanceView,
    Result,
};
use chrono::NaiveDate;
use std::sync::Arc;

/// Query side for daily balances
pub struct BalanceReader {
    store: Arc<BalanceStore>,
    cache: Arc<BalanceCache>,
    clock: Arc<dyn Clock>,
}

impl BalanceReader {
    /// Create new reader
    pub fn new(store: Arc<BalanceStore>, cache: Arc<BalanceCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache,
            clock,
        }
    }

    /// Balances for a date (default: today), merchant-ordered
    ///
    /// A hit never touches the store. A miss reads the store and populates
    /// the cache with the fixed TTL; the cache is never refreshed by writers.
    pub fn daily_balances(&self, date: Option<NaiveDate>) -> Result<Vec<DailyBalanceView>> {
        let date = date.unwrap_or_else(|| self.clock.now().date_naive());

        if let Some(snapshot) = self.cache.get(date) {
            CACHE_LOOKUP_TOTAL.with_label_values(&["hit"]).inc();
            return Ok(snapshot);
        }
        CACHE_LOOKUP_TOTAL.with_label_values(&["miss"]).inc();

        let views: Vec<DailyBalanceView> = self
            .store
            .balances_for(date)?
            .into_iter()
            .map(DailyBalanceView::from)
            .collect();

        self.cache.put(date, views.clone());

        Ok(views)
    }
}
