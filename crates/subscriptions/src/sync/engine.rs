//! Resumable, quota-aware import of a source list
//!
//! Each run diffs the source list against a fresh destination snapshot,
//! then issues creation calls in source order until the day's allowance,
//! the remote quota, or the list runs out. The progress record is saved
//! after every call so a crash loses at most the call in flight.

use chrono::NaiveDate;
use log::{error, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use super::{CancellationToken, Pacer, QuotaGovernor, count, destination_snapshot};
use crate::error::{MigrationError, Result};
use crate::models::{ChannelId, ProgressRecord};
use crate::service::{InsertError, SubscriptionService};
use crate::storage::ProgressStore;

/// Options for an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Maximum creation calls per calendar day
    pub daily_limit: u32,
    /// Wait between consecutive creation calls
    pub pacing_delay: Duration,
}

impl SyncOptions {
    pub const DEFAULT_DAILY_LIMIT: u32 = 60;
    pub const DEFAULT_PACING: Duration = Duration::from_secs(5);
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            daily_limit: Self::DEFAULT_DAILY_LIMIT,
            pacing_delay: Self::DEFAULT_PACING,
        }
    }
}

/// Result of one creation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Subscribed,
    /// Remote reported the subscription already exists; counts as imported
    Duplicate,
    /// Remote quota ran out; the run stopped here
    QuotaExceeded(String),
    /// Skipped after a failure; retried on a later run
    TransientError(String),
    /// The run was aborted
    FatalError(String),
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Destination already holds every source channel
    AlreadyComplete,
    /// The local daily ceiling is used up; pending channels remain
    DailyLimitReached,
    /// Every pending channel was attempted
    Finished,
    /// The remote service refused further calls
    RemoteQuotaExceeded,
    /// Cancelled between calls
    Interrupted,
}

/// Terminal summary of an import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub outcome: RunOutcome,
    pub date: NaiveDate,
    /// Creation calls issued this run
    pub attempted: u32,
    pub subscribed: u32,
    pub duplicates: u32,
    pub failed: u32,
    /// Source channels found at the destination before any call
    pub already_present: u32,
    /// Pending channels left untouched for a later run
    pub deferred: u32,
    pub daily_count: u32,
    pub daily_limit: u32,
    pub total_imported: u32,
    pub total_source: u32,
    /// Per-call outcomes, in call order
    pub attempts: Vec<(ChannelId, ChannelOutcome)>,
}

impl ImportReport {
    fn from_record(outcome: RunOutcome, record: &ProgressRecord, daily_limit: u32) -> Self {
        Self {
            outcome,
            date: record.last_run_date,
            attempted: 0,
            subscribed: 0,
            duplicates: 0,
            failed: 0,
            already_present: 0,
            deferred: 0,
            daily_count: record.daily_imported_count,
            daily_limit,
            total_imported: record.total_imported,
            total_source: record.total_source_count,
            attempts: Vec::new(),
        }
    }

    /// Source channels not yet confirmed at the destination
    pub fn remaining(&self) -> u32 {
        self.total_source.saturating_sub(self.total_imported)
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            RunOutcome::AlreadyComplete => {
                writeln!(f, "Destination already has every source subscription.")?
            }
            RunOutcome::DailyLimitReached => writeln!(
                f,
                "Reached the limit of {} subscriptions today ({}). Continue tomorrow.",
                self.daily_limit, self.date
            )?,
            RunOutcome::Finished => writeln!(f, "All pending subscriptions were attempted.")?,
            RunOutcome::RemoteQuotaExceeded => writeln!(
                f,
                "Quota exceeded. Wait until the API quota resets (typically after 24 hours)."
            )?,
            RunOutcome::Interrupted => writeln!(f, "Interrupted; progress saved.")?,
        }
        writeln!(
            f,
            "Attempted {}: {} subscribed, {} already subscribed, {} failed.",
            self.attempted, self.subscribed, self.duplicates, self.failed
        )?;
        write!(
            f,
            "{} subscribed this run; {}/{} total; {} remaining.",
            self.subscribed,
            self.total_imported,
            self.total_source,
            self.remaining()
        )
    }
}

/// Replays a source list against the destination account
pub struct SyncEngine<'a> {
    service: &'a dyn SubscriptionService,
    store: &'a dyn ProgressStore,
    governor: QuotaGovernor,
    pacer: Pacer,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        options: SyncOptions,
        service: &'a dyn SubscriptionService,
        store: &'a dyn ProgressStore,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            store,
            governor: QuotaGovernor::new(options.daily_limit),
            pacer: Pacer::new(options.pacing_delay, cancel),
        }
    }

    /// Run one import pass for `today`
    ///
    /// Reaching the daily ceiling, remote quota exhaustion and cancellation
    /// all return `Ok`; only storage loss, credential loss and listing
    /// failures return `Err`.
    pub fn run(&self, source: &[ChannelId], today: NaiveDate) -> Result<ImportReport> {
        let daily_limit = self.governor.daily_limit();
        let mut record = self.store.load(today)?;

        let allowance = self.governor.admit(&mut record, self.store, today)?;
        if allowance == 0 {
            info!(
                "Reached the limit of {daily_limit} subscriptions today ({today}). Continue tomorrow."
            );
            return Ok(ImportReport::from_record(
                RunOutcome::DailyLimitReached,
                &record,
                daily_limit,
            ));
        }
        if self.pacer.is_cancelled() {
            return Ok(ImportReport::from_record(
                RunOutcome::Interrupted,
                &record,
                daily_limit,
            ));
        }

        let mut destination = destination_snapshot(self.service)?;
        let unique = unique_in_order(source);
        let pending: Vec<&ChannelId> = unique
            .iter()
            .copied()
            .filter(|c| !destination.contains(*c))
            .collect();

        if record.total_source_count == 0 {
            record.total_source_count = count(unique.len());
        }
        // Reconcile against the live snapshot; the destination may have
        // changed since the last run.
        record.total_imported = count(unique.len() - pending.len());
        self.store.save(&record)?;

        let mut report = ImportReport::from_record(RunOutcome::Finished, &record, daily_limit);
        report.already_present = record.total_imported;

        if pending.is_empty() {
            info!("All {} source channels are already subscribed", unique.len());
            report.outcome = RunOutcome::AlreadyComplete;
            return Ok(report);
        }
        info!(
            "{} channels pending, {} allowed today",
            pending.len(),
            allowance
        );

        for channel in &pending {
            if report.attempted >= allowance {
                report.outcome = RunOutcome::DailyLimitReached;
                break;
            }
            let proceed = if report.attempted == 0 {
                !self.pacer.is_cancelled()
            } else {
                self.pacer.pause()
            };
            if !proceed {
                info!("Cancelled after {} attempts", report.attempted);
                report.outcome = RunOutcome::Interrupted;
                break;
            }

            let result = self.service.create_subscription(channel);
            report.attempted += 1;

            let outcome = match result {
                Ok(()) => {
                    record.total_imported += 1;
                    destination.insert((*channel).clone());
                    report.subscribed += 1;
                    info!(
                        "Subscribed to channel: {channel} ({}/{})",
                        record.total_imported, record.total_source_count
                    );
                    ChannelOutcome::Subscribed
                }
                Err(InsertError::Duplicate(detail)) => {
                    record.total_imported += 1;
                    destination.insert((*channel).clone());
                    report.duplicates += 1;
                    info!("Skipped duplicate subscription for channel: {channel} ({detail})");
                    ChannelOutcome::Duplicate
                }
                Err(InsertError::QuotaExceeded(detail)) => {
                    warn!("Remote quota exceeded at channel {channel}: {detail}");
                    ChannelOutcome::QuotaExceeded(detail)
                }
                Err(InsertError::Transient(detail)) => {
                    report.failed += 1;
                    warn!("Error subscribing to {channel}: {detail}");
                    ChannelOutcome::TransientError(detail)
                }
                Err(InsertError::Fatal(detail)) => {
                    report.failed += 1;
                    error!("Fatal error subscribing to {channel}: {detail}");
                    ChannelOutcome::FatalError(detail)
                }
            };

            // Every issued call consumes a unit of the daily allowance
            self.governor.record_attempt(&mut record, self.store)?;
            report.attempts.push(((*channel).clone(), outcome.clone()));

            match outcome {
                ChannelOutcome::QuotaExceeded(_) => {
                    report.outcome = RunOutcome::RemoteQuotaExceeded;
                    break;
                }
                ChannelOutcome::FatalError(detail) => {
                    error!(
                        "Aborting run; imported {}/{} so far",
                        record.total_imported, record.total_source_count
                    );
                    return Err(MigrationError::RemoteFatal {
                        channel: channel.to_string(),
                        detail,
                    });
                }
                _ => {}
            }
        }

        self.store.save(&record)?;

        // A call refused by the remote quota leaves its channel pending
        let settled = match report.outcome {
            RunOutcome::RemoteQuotaExceeded => report.attempted.saturating_sub(1),
            _ => report.attempted,
        };
        report.deferred = count(pending.len()).saturating_sub(settled);
        report.daily_count = record.daily_imported_count;
        report.total_imported = record.total_imported;
        report.total_source = record.total_source_count;

        info!(
            "Imported {} subscriptions today. Total imported: {} out of {}",
            report.daily_count, report.total_imported, report.total_source
        );
        Ok(report)
    }
}

/// First occurrence of each identifier, in source order
fn unique_in_order(source: &[ChannelId]) -> Vec<&ChannelId> {
    let mut seen = HashSet::new();
    source.iter().filter(|c| seen.insert(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InMemorySubscriptionService;
    use crate::storage::InMemoryProgressStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn ids(raw: &[&str]) -> Vec<ChannelId> {
        raw.iter().map(|s| ChannelId::from(*s)).collect()
    }

    fn options(daily_limit: u32) -> SyncOptions {
        SyncOptions {
            daily_limit,
            pacing_delay: Duration::ZERO,
        }
    }

    fn seeded_store(total: u32) -> InMemoryProgressStore {
        InMemoryProgressStore::with_record(ProgressRecord::new(day(1)).with_export(day(1), total))
    }

    #[test]
    fn test_unique_in_order() {
        let source = ids(&["b", "a", "b", "c", "a"]);
        let unique: Vec<&str> = unique_in_order(&source).iter().map(|c| c.as_str()).collect();
        assert_eq!(unique, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_limited_run_stops_at_ceiling() {
        let service = InMemorySubscriptionService::with_subscriptions(["B"]);
        let store = seeded_store(4);
        let engine = SyncEngine::new(options(2), &service, &store, CancellationToken::new());

        let report = engine.run(&ids(&["A", "B", "C", "D"]), day(1)).unwrap();

        assert_eq!(report.outcome, RunOutcome::DailyLimitReached);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.subscribed, 2);
        assert_eq!(report.already_present, 1);
        assert_eq!(report.deferred, 1);
        assert_eq!(report.total_imported, 3);
        assert_eq!(report.remaining(), 1);
        assert_eq!(service.create_calls(), ids(&["A", "C"]));

        let record = store.record().unwrap();
        assert_eq!(record.daily_imported_count, 2);
        assert_eq!(record.total_imported, 3);
    }

    #[test]
    fn test_exhausted_day_makes_no_remote_calls() {
        let service = InMemorySubscriptionService::new();
        let mut record = ProgressRecord::new(day(1)).with_export(day(1), 10);
        record.daily_imported_count = 5;
        let store = InMemoryProgressStore::with_record(record);
        let engine = SyncEngine::new(options(5), &service, &store, CancellationToken::new());

        let report = engine.run(&ids(&["A"]), day(1)).unwrap();

        assert_eq!(report.outcome, RunOutcome::DailyLimitReached);
        assert_eq!(report.attempted, 0);
        assert_eq!(service.list_calls(), 0);
        assert!(service.create_calls().is_empty());
    }

    #[test]
    fn test_already_complete() {
        let service = InMemorySubscriptionService::with_subscriptions(["A", "B", "X"]);
        let store = seeded_store(2);
        let engine = SyncEngine::new(options(10), &service, &store, CancellationToken::new());

        let report = engine.run(&ids(&["A", "B"]), day(1)).unwrap();

        assert_eq!(report.outcome, RunOutcome::AlreadyComplete);
        // Channels outside the source list are not counted
        assert_eq!(report.total_imported, 2);
        assert!(service.create_calls().is_empty());
    }

    #[test]
    fn test_duplicate_counts_as_imported() {
        let service = InMemorySubscriptionService::new();
        service.fail_next("E", InsertError::Duplicate("subscriptionDuplicate".into()));
        let store = seeded_store(2);
        let engine = SyncEngine::new(options(10), &service, &store, CancellationToken::new());

        let report = engine.run(&ids(&["E", "F"]), day(1)).unwrap();

        assert_eq!(report.outcome, RunOutcome::Finished);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.subscribed, 1);
        assert_eq!(report.total_imported, 2);
        assert_eq!(service.create_calls(), ids(&["E", "F"]));
    }

    #[test]
    fn test_transient_error_skips_and_consumes_quota() {
        let service = InMemorySubscriptionService::new();
        service.fail_next("A", InsertError::Transient("HTTP 500".into()));
        let store = seeded_store(3);
        let engine = SyncEngine::new(options(10), &service, &store, CancellationToken::new());

        let report = engine.run(&ids(&["A", "B", "C"]), day(1)).unwrap();

        assert_eq!(report.outcome, RunOutcome::Finished);
        assert_eq!(report.failed, 1);
        assert_eq!(report.subscribed, 2);
        assert_eq!(report.daily_count, 3);
        assert_eq!(report.total_imported, 2);
        assert_eq!(
            report.attempts[0],
            (ChannelId::new("A"), ChannelOutcome::TransientError("HTTP 500".into()))
        );
    }

    #[test]
    fn test_remote_quota_halts_run() {
        let service = InMemorySubscriptionService::new();
        service.set_remote_quota(1);
        let store = seeded_store(3);
        let engine = SyncEngine::new(options(10), &service, &store, CancellationToken::new());

        let report = engine.run(&ids(&["A", "B", "C"]), day(1)).unwrap();

        assert_eq!(report.outcome, RunOutcome::RemoteQuotaExceeded);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.subscribed, 1);
        // B was refused and C never tried
        assert_eq!(report.deferred, 2);
        assert_eq!(service.create_calls(), ids(&["A", "B"]));
        assert_eq!(store.record().unwrap().total_imported, 1);
    }

    #[test]
    fn test_fatal_error_aborts_after_persisting() {
        let service = InMemorySubscriptionService::new();
        service.fail_next("B", InsertError::Fatal("HTTP 401".into()));
        let store = seeded_store(3);
        let engine = SyncEngine::new(options(10), &service, &store, CancellationToken::new());

        let err = engine.run(&ids(&["A", "B", "C"]), day(1)).unwrap_err();

        assert!(matches!(err, MigrationError::RemoteFatal { ref channel, .. } if channel == "B"));
        assert_eq!(service.create_calls(), ids(&["A", "B"]));
        let record = store.record().unwrap();
        assert_eq!(record.total_imported, 1);
        assert_eq!(record.daily_imported_count, 2);
    }

    #[test]
    fn test_storage_loss_stops_before_mutating() {
        let service = InMemorySubscriptionService::new();
        let store = InMemoryProgressStore::new();
        store.fail_saves_after(0);
        let engine = SyncEngine::new(options(10), &service, &store, CancellationToken::new());

        let err = engine.run(&ids(&["A"]), day(1)).unwrap_err();

        assert!(matches!(err, MigrationError::Storage(_)));
        assert!(service.create_calls().is_empty());
    }

    #[test]
    fn test_storage_loss_mid_run_stops_calls() {
        let service = InMemorySubscriptionService::new();
        let store = seeded_store(3);
        // Baseline save succeeds, the first attempt's save fails
        store.fail_saves_after(1);
        let engine = SyncEngine::new(options(10), &service, &store, CancellationToken::new());

        let err = engine.run(&ids(&["A", "B", "C"]), day(1)).unwrap_err();

        assert!(matches!(err, MigrationError::Storage(_)));
        assert_eq!(service.create_calls(), ids(&["A"]));
    }

    #[test]
    fn test_cancelled_before_start() {
        let service = InMemorySubscriptionService::new();
        let store = seeded_store(1);
        let token = CancellationToken::new();
        token.cancel();
        let engine = SyncEngine::new(options(10), &service, &store, token);

        let report = engine.run(&ids(&["A"]), day(1)).unwrap();

        assert_eq!(report.outcome, RunOutcome::Interrupted);
        assert!(service.create_calls().is_empty());
    }

    #[test]
    fn test_lowered_limit_clamps_persisted_count() {
        let service = InMemorySubscriptionService::new();
        let mut record = ProgressRecord::new(day(1)).with_export(day(1), 10);
        record.daily_imported_count = 5;
        let store = InMemoryProgressStore::with_record(record);
        let engine = SyncEngine::new(options(3), &service, &store, CancellationToken::new());

        let report = engine.run(&ids(&["A"]), day(1)).unwrap();

        assert_eq!(report.outcome, RunOutcome::DailyLimitReached);
        assert_eq!(report.daily_count, 3);
        assert!(service.create_calls().is_empty());
        assert_eq!(store.record().map(|r| r.daily_imported_count), Some(3));
    }

    #[test]
    fn test_pacing_applies_after_failures() {
        let service = InMemorySubscriptionService::new();
        service.fail_next("A", InsertError::Transient("HTTP 500".into()));
        service.fail_next("B", InsertError::Transient("HTTP 503".into()));
        let store = seeded_store(3);
        let delay = Duration::from_millis(50);
        let engine = SyncEngine::new(
            SyncOptions {
                daily_limit: 10,
                pacing_delay: delay,
            },
            &service,
            &store,
            CancellationToken::new(),
        );

        let started = std::time::Instant::now();
        let report = engine.run(&ids(&["A", "B", "C"]), day(1)).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.failed, 2);
        // One pause between each pair of consecutive calls
        assert!(elapsed >= delay * 2, "elapsed {elapsed:?}");
    }

    #[test]
    fn test_rollover_restores_allowance() {
        let service = InMemorySubscriptionService::new();
        let mut record = ProgressRecord::new(day(1)).with_export(day(1), 2);
        record.daily_imported_count = 2;
        let store = InMemoryProgressStore::with_record(record);
        let engine = SyncEngine::new(options(2), &service, &store, CancellationToken::new());

        let report = engine.run(&ids(&["A", "B"]), day(2)).unwrap();

        assert_eq!(report.outcome, RunOutcome::Finished);
        assert_eq!(report.attempted, 2);
        let record = store.record().unwrap();
        assert_eq!(record.last_run_date, day(2));
        assert_eq!(record.daily_imported_count, 2);
    }

    #[test]
    fn test_missing_export_uses_unique_source_size() {
        let service = InMemorySubscriptionService::new();
        let store = InMemoryProgressStore::new();
        let engine = SyncEngine::new(options(10), &service, &store, CancellationToken::new());

        let report = engine.run(&ids(&["A", "B", "A"]), day(1)).unwrap();

        assert_eq!(report.total_source, 2);
        assert_eq!(report.attempted, 2);
        assert_eq!(service.subscriptions(), ids(&["A", "B"]));
    }

    #[test]
    fn test_report_summary_line() {
        let service = InMemorySubscriptionService::with_subscriptions(["B"]);
        let store = seeded_store(4);
        let engine = SyncEngine::new(options(2), &service, &store, CancellationToken::new());

        let report = engine.run(&ids(&["A", "B", "C", "D"]), day(1)).unwrap();

        assert!(
            report
                .to_string()
                .ends_with("2 subscribed this run; 3/4 total; 1 remaining.")
        );
    }
}
