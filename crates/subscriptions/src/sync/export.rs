//! Export of the source account's subscriptions

use chrono::NaiveDate;
use log::info;
use std::fmt;

use super::{count, list_all_subscriptions};
use crate::error::Result;
use crate::service::SubscriptionService;
use crate::storage::{ProgressStore, SourceListWriter};

/// Summary of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub exported: u32,
    pub export_date: NaiveDate,
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exported {} subscriptions ({})", self.exported, self.export_date)
    }
}

/// Snapshot the source account into the source list and seed progress
///
/// The list is rewritten in full. The progress record gets the new export
/// date and total; its daily quota fields are kept.
pub fn export_subscriptions(
    service: &dyn SubscriptionService,
    writer: &SourceListWriter,
    store: &dyn ProgressStore,
    today: NaiveDate,
) -> Result<ExportReport> {
    let channels = list_all_subscriptions(service, |fetched, total| match total {
        Some(total) => info!("Fetched {fetched}/{total} subscriptions"),
        None => info!("Fetched {fetched} subscriptions"),
    })?;

    writer.write(&channels)?;

    let exported = count(channels.len());
    let record = store.load(today)?.with_export(today, exported);
    store.save(&record)?;

    info!("Exported {exported} subscriptions");
    Ok(ExportReport {
        exported,
        export_date: today,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelId, ProgressRecord};
    use crate::service::InMemorySubscriptionService;
    use crate::storage::{InMemoryProgressStore, SourceListReader};
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_export_writes_list_and_seeds_progress() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subscriptions.txt");
        let service = InMemorySubscriptionService::with_subscriptions(["UCz", "UCa", "UCm"]);
        let store = InMemoryProgressStore::new();

        let report =
            export_subscriptions(&service, &SourceListWriter::new(&path), &store, day(3)).unwrap();

        assert_eq!(report.exported, 3);
        assert_eq!(
            SourceListReader::new(&path).read().unwrap(),
            vec![ChannelId::new("UCz"), ChannelId::new("UCa"), ChannelId::new("UCm")]
        );
        let record = store.record().unwrap();
        assert_eq!(record.export_date, day(3));
        assert_eq!(record.total_source_count, 3);
    }

    #[test]
    fn test_reexport_keeps_daily_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subscriptions.txt");
        let service = InMemorySubscriptionService::with_subscriptions(["UCa"]);
        let mut existing = ProgressRecord::new(day(1)).with_export(day(1), 10);
        existing.daily_imported_count = 4;
        let store = InMemoryProgressStore::with_record(existing);

        export_subscriptions(&service, &SourceListWriter::new(&path), &store, day(2)).unwrap();

        let record = store.record().unwrap();
        assert_eq!(record.export_date, day(2));
        assert_eq!(record.total_source_count, 1);
        assert_eq!(record.last_run_date, day(1));
        assert_eq!(record.daily_imported_count, 4);
    }

    #[test]
    fn test_failed_listing_leaves_previous_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subscriptions.txt");
        std::fs::write(&path, "UCold\n").unwrap();
        let service = InMemorySubscriptionService::with_subscriptions(["UCnew"]);
        service.set_list_unavailable(true);
        let store = InMemoryProgressStore::new();

        assert!(export_subscriptions(&service, &SourceListWriter::new(&path), &store, day(2)).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "UCold\n");
        assert!(store.record().is_none());
    }
}
