//! Subscriptions crate - channel subscription migration between accounts
//!
//! This crate provides the business logic for moving a follow list from one
//! YouTube account to another under a strict daily quota:
//! - Domain models (ChannelId, ProgressRecord)
//! - YouTube Data API client and OAuth authentication
//! - Remote service trait with an in-memory implementation for tests
//! - Durable progress record and source list storage
//! - Export and a resumable, quota-aware import engine
//!
//! Imports are meant to be re-run (e.g. once per day) until every source
//! channel is present at the destination.

pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod storage;
pub mod sync;
pub mod youtube;

pub use config::{AccountRole, ClientSecrets, MigrationConfig};
pub use error::{MigrationError, StorageError};
pub use models::{ChannelId, ProgressRecord};
pub use service::{InMemorySubscriptionService, InsertError, SubscriptionPage, SubscriptionService};
pub use storage::{
    FileProgressStore, InMemoryProgressStore, ProgressStore, SourceListReader, SourceListWriter,
};
pub use sync::{
    // Import
    CancellationToken, ChannelOutcome, ImportReport, RunOutcome, SyncEngine, SyncOptions,
    // Export
    ExportReport, export_subscriptions,
    // Building blocks
    Pacer, QuotaGovernor, destination_snapshot, list_all_subscriptions,
};
pub use youtube::{Scope, YoutubeAuth, YoutubeClient, remove_token_file};
