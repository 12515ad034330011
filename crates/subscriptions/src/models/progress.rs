//! Migration progress tracking across runs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted progress of a subscription migration
///
/// Rewritten to stable storage after every state change so an interrupted
/// import loses at most the outcome of the attempt in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// When the source list was exported
    pub export_date: NaiveDate,
    /// Size of the source list at export time
    pub total_source_count: u32,
    /// Date of the most recent import attempt
    pub last_run_date: NaiveDate,
    /// Source channels confirmed present at the destination
    pub total_imported: u32,
    /// Creation calls issued since `last_run_date`
    pub daily_imported_count: u32,
}

impl ProgressRecord {
    /// Zero-valued record used when no prior state exists
    pub fn new(today: NaiveDate) -> Self {
        Self {
            export_date: today,
            total_source_count: 0,
            last_run_date: today,
            total_imported: 0,
            daily_imported_count: 0,
        }
    }

    /// Record a fresh export snapshot
    ///
    /// Daily quota fields are left alone: they describe the destination
    /// account's day, not the export.
    pub fn with_export(mut self, export_date: NaiveDate, total_source_count: u32) -> Self {
        self.export_date = export_date;
        self.total_source_count = total_source_count;
        self
    }

    /// Whether the daily counter belongs to an earlier day
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.last_run_date != today
    }

    /// Source channels still missing at the destination
    pub fn remaining(&self) -> u32 {
        self.total_source_count.saturating_sub(self.total_imported)
    }

    /// Whether every exported channel has been accounted for
    pub fn is_complete(&self) -> bool {
        self.total_source_count > 0 && self.remaining() == 0
    }
}
