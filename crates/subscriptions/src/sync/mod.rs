//! Export and resumable import of subscriptions
//!
//! Both directions are idempotent: export fully refreshes the source list,
//! and import diffs it against a live destination snapshot before making
//! any creation call.

mod engine;
mod export;
mod lister;
mod pacing;
mod quota;

pub use engine::{ChannelOutcome, ImportReport, RunOutcome, SyncEngine, SyncOptions};
pub use export::{ExportReport, export_subscriptions};
pub use lister::{destination_snapshot, list_all_subscriptions};
pub use pacing::{CancellationToken, Pacer};
pub use quota::QuotaGovernor;

/// Saturating conversion for report counters
pub(crate) fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
