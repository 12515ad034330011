//! In-memory progress store
//!
//! Used for tests and dry runs. Saves can be made to fail after a given
//! number of successes to exercise storage-loss handling.

use std::io::Error;
use std::sync::Mutex;

use chrono::NaiveDate;

use super::ProgressStore;
use crate::error::StorageError;
use crate::models::ProgressRecord;

#[derive(Default)]
struct State {
    record: Option<ProgressRecord>,
    saves: usize,
    fail_after: Option<usize>,
}

/// In-memory implementation of ProgressStore
#[derive(Default)]
pub struct InMemoryProgressStore {
    state: Mutex<State>,
}

impl InMemoryProgressStore {
    /// Create an empty store (loads as a fresh record)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding an existing record
    pub fn with_record(record: ProgressRecord) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state.record = Some(record);
        }
        store
    }

    /// Make every save after the first `successful` ones fail
    pub fn fail_saves_after(&self, successful: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_after = Some(successful);
        }
    }

    /// The last successfully saved record
    pub fn record(&self) -> Option<ProgressRecord> {
        self.state.lock().ok().and_then(|s| s.record.clone())
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.state.lock().map(|s| s.saves).unwrap_or(0)
    }
}

fn unavailable(reason: &str) -> StorageError {
    StorageError::new("<memory>", Error::other(reason.to_string()))
}

impl ProgressStore for InMemoryProgressStore {
    fn load(&self, today: NaiveDate) -> Result<ProgressRecord, StorageError> {
        let state = self.state.lock().map_err(|_| unavailable("lock poisoned"))?;
        Ok(state
            .record
            .clone()
            .unwrap_or_else(|| ProgressRecord::new(today)))
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut state = self.state.lock().map_err(|_| unavailable("lock poisoned"))?;
        if state.fail_after.is_some_and(|limit| state.saves >= limit) {
            return Err(unavailable("medium not writable"));
        }
        state.record = Some(record.clone());
        state.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_empty_store_loads_fresh_record() {
        let store = InMemoryProgressStore::new();
        assert_eq!(store.load(today()).unwrap(), ProgressRecord::new(today()));
        assert!(store.record().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let store = InMemoryProgressStore::new();
        let record = ProgressRecord::new(today()).with_export(today(), 10);

        store.save(&record).unwrap();

        assert_eq!(store.load(today()).unwrap(), record);
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_fail_saves_after() {
        let store = InMemoryProgressStore::new();
        store.fail_saves_after(1);
        let record = ProgressRecord::new(today());

        assert!(store.save(&record).is_ok());
        assert!(store.save(&record).is_err());
        assert_eq!(store.saves(), 1);
    }
}
