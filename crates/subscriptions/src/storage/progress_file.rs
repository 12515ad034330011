//! File-backed progress record
//!
//! Layout, one `Key: value` pair per line:
//! ```text
//! # Subscription Migration Progress
//! Export Date: 2024-03-01
//! Total Subscriptions in Source Account: 240
//! Last Import Date: 2024-03-02
//! Total Subscriptions Imported: 120
//! Daily Import Count: 60
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};

use super::{ProgressStore, write_atomically};
use crate::error::StorageError;
use crate::models::ProgressRecord;

const HEADER: &str = "# Subscription Migration Progress";
const EXPORT_DATE: &str = "Export Date";
const TOTAL_SOURCE: &str = "Total Subscriptions in Source Account";
const LAST_RUN_DATE: &str = "Last Import Date";
const TOTAL_IMPORTED: &str = "Total Subscriptions Imported";
const DAILY_COUNT: &str = "Daily Import Count";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Progress record stored as a small key-value text file
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self, today: NaiveDate) -> Result<ProgressRecord, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(parse_progress(&content, today)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} not found, starting fresh", self.path.display());
                Ok(ProgressRecord::new(today))
            }
            Err(e) => Err(StorageError::new(&self.path, e)),
        }
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        write_atomically(&self.path, &render_progress(record))
            .map_err(|e| StorageError::new(&self.path, e))
    }
}

/// Render a record in the progress file layout
pub fn render_progress(record: &ProgressRecord) -> String {
    format!(
        "{HEADER}\n\
         {EXPORT_DATE}: {}\n\
         {TOTAL_SOURCE}: {}\n\
         {LAST_RUN_DATE}: {}\n\
         {TOTAL_IMPORTED}: {}\n\
         {DAILY_COUNT}: {}\n",
        record.export_date.format(DATE_FORMAT),
        record.total_source_count,
        record.last_run_date.format(DATE_FORMAT),
        record.total_imported,
        record.daily_imported_count,
    )
}

/// Parse the progress file layout leniently
///
/// Missing keys keep their defaults (counts 0, dates `today`); comments,
/// unknown keys and unparseable values are skipped.
pub fn parse_progress(content: &str, today: NaiveDate) -> ProgressRecord {
    let mut record = ProgressRecord::new(today);

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            debug!("Ignoring malformed progress line: {line}");
            continue;
        };
        let value = value.trim();

        let applied = match key.trim() {
            EXPORT_DATE => parse_date(value).map(|d| record.export_date = d),
            TOTAL_SOURCE => value.parse().ok().map(|n| record.total_source_count = n),
            LAST_RUN_DATE => parse_date(value).map(|d| record.last_run_date = d),
            TOTAL_IMPORTED => value.parse().ok().map(|n| record.total_imported = n),
            DAILY_COUNT => value.parse().ok().map(|n| record.daily_imported_count = n),
            _ => None,
        };
        if applied.is_none() {
            debug!("Ignoring malformed progress line: {line}");
        }
    }

    record
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}
