//! Service trait definitions

use crate::error::MigrationError;
use crate::models::ChannelId;

/// One page of the authenticated account's subscriptions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPage {
    pub items: Vec<ChannelId>,
    /// Cursor for the next page; `None` on the last page
    pub next_page_token: Option<String>,
    /// Server-side estimate of the total across all pages
    pub total_results: Option<u32>,
}

/// Classified failure of a subscription creation call
///
/// Decided once where the response is read; the engine matches on the
/// variant and never looks inside `detail`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InsertError {
    /// The account already follows the channel
    #[error("already subscribed: {0}")]
    Duplicate(String),

    /// The remote side refuses further calls today
    #[error("remote quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Any other failure for this channel; later channels may still succeed
    #[error("transient failure: {0}")]
    Transient(String),

    /// Further calls cannot succeed (credentials revoked, unauthorized)
    #[error("fatal failure: {0}")]
    Fatal(String),
}

/// Operations the migration needs from the remote service
pub trait SubscriptionService {
    /// Fetch one page of the account's subscriptions
    ///
    /// # Errors
    /// `RemoteUnavailable` on transport failures, `Credential` when no
    /// access token can be obtained.
    fn list_subscriptions(&self, page_token: Option<&str>)
    -> Result<SubscriptionPage, MigrationError>;

    /// Subscribe the account to `channel`
    fn create_subscription(&self, channel: &ChannelId) -> Result<(), InsertError>;
}
