//! Storage trait definitions

use chrono::NaiveDate;

use crate::error::StorageError;
use crate::models::ProgressRecord;

/// Persistence for the migration progress record
///
/// Implementations must make `save` atomic with respect to crashes: a
/// failed or interrupted save leaves the previous record intact.
pub trait ProgressStore: Send + Sync {
    /// Load the record, or a zero-valued record dated `today` if none exists
    fn load(&self, today: NaiveDate) -> Result<ProgressRecord, StorageError>;

    /// Replace the stored record
    fn save(&self, record: &ProgressRecord) -> Result<(), StorageError>;
}
