//! Local daily ceiling on creation calls

use chrono::NaiveDate;
use log::info;

use crate::error::StorageError;
use crate::models::ProgressRecord;
use crate::storage::ProgressStore;

/// Enforces a fixed number of creation calls per calendar day
///
/// The counter and its date live in the [`ProgressRecord`]; the governor
/// only applies the limit and the rollover rule to it.
#[derive(Debug, Clone, Copy)]
pub struct QuotaGovernor {
    daily_limit: u32,
}

impl QuotaGovernor {
    pub fn new(daily_limit: u32) -> Self {
        Self { daily_limit }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Roll the counter over if `today` is a new day, then return the calls
    /// still allowed today
    ///
    /// A rollover, or a count clamped down to a lowered limit, is persisted
    /// immediately.
    pub fn admit(
        &self,
        record: &mut ProgressRecord,
        store: &dyn ProgressStore,
        today: NaiveDate,
    ) -> Result<u32, StorageError> {
        if record.is_stale(today) {
            info!(
                "New day ({today}), resetting daily count from {} (last run {})",
                record.daily_imported_count, record.last_run_date
            );
            record.last_run_date = today;
            record.daily_imported_count = 0;
            store.save(record)?;
        } else if record.daily_imported_count > self.daily_limit {
            // The limit was lowered since the last run today
            info!(
                "Daily count {} exceeds the limit of {}, clamping",
                record.daily_imported_count, self.daily_limit
            );
            record.daily_imported_count = self.daily_limit;
            store.save(record)?;
        }
        Ok(self.daily_limit.saturating_sub(record.daily_imported_count))
    }

    /// Count one issued creation call and persist the record
    pub fn record_attempt(
        &self,
        record: &mut ProgressRecord,
        store: &dyn ProgressStore,
    ) -> Result<(), StorageError> {
        record.daily_imported_count = record.daily_imported_count.saturating_add(1);
        store.save(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryProgressStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_same_day_keeps_count() {
        let store = InMemoryProgressStore::new();
        let mut record = ProgressRecord::new(day(1));
        record.daily_imported_count = 40;

        let remaining = QuotaGovernor::new(60).admit(&mut record, &store, day(1)).unwrap();

        assert_eq!(remaining, 20);
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn test_rollover_resets_and_persists() {
        let store = InMemoryProgressStore::new();
        let mut record = ProgressRecord::new(day(1));
        record.daily_imported_count = 60;

        let remaining = QuotaGovernor::new(60).admit(&mut record, &store, day(2)).unwrap();

        assert_eq!(remaining, 60);
        assert_eq!(record.last_run_date, day(2));
        assert_eq!(record.daily_imported_count, 0);
        assert_eq!(store.record(), Some(record));
    }

    #[test]
    fn test_exhausted_and_lowered_limit() {
        let store = InMemoryProgressStore::new();
        let mut record = ProgressRecord::new(day(1));
        record.daily_imported_count = 60;

        assert_eq!(QuotaGovernor::new(60).admit(&mut record, &store, day(1)).unwrap(), 0);
        assert_eq!(store.saves(), 0);

        assert_eq!(QuotaGovernor::new(30).admit(&mut record, &store, day(1)).unwrap(), 0);
        assert_eq!(record.daily_imported_count, 30);
        assert_eq!(store.record().map(|r| r.daily_imported_count), Some(30));
    }

    #[test]
    fn test_record_attempt_persists() {
        let store = InMemoryProgressStore::new();
        let mut record = ProgressRecord::new(day(1));

        QuotaGovernor::new(60).record_attempt(&mut record, &store).unwrap();

        assert_eq!(record.daily_imported_count, 1);
        assert_eq!(store.record().map(|r| r.daily_imported_count), Some(1));
    }

    #[test]
    fn test_rollover_save_failure_is_reported() {
        let store = InMemoryProgressStore::new();
        store.fail_saves_after(0);
        let mut record = ProgressRecord::new(day(1));

        assert!(QuotaGovernor::new(60).admit(&mut record, &store, day(2)).is_err());
    }
}
