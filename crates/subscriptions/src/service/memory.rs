//! In-memory subscription service
//!
//! Stands in for the remote API in tests. Failures for individual channels
//! can be scripted, and a remote-side quota cut-off can be simulated.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::{InsertError, SubscriptionPage, SubscriptionService};
use crate::error::MigrationError;
use crate::models::ChannelId;

#[derive(Default)]
struct State {
    subscriptions: Vec<ChannelId>,
    scripted: HashMap<ChannelId, VecDeque<InsertError>>,
    create_calls: Vec<ChannelId>,
    list_calls: usize,
    quota_left: Option<usize>,
    list_unavailable: bool,
}

/// In-memory implementation of SubscriptionService
pub struct InMemorySubscriptionService {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for InMemorySubscriptionService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySubscriptionService {
    /// Remote page size used by the YouTube API
    pub const DEFAULT_PAGE_SIZE: usize = 50;

    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// Start with an account already following `channels`
    pub fn with_subscriptions<I, C>(channels: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ChannelId>,
    {
        let service = Self::new();
        if let Ok(mut state) = service.state.lock() {
            state.subscriptions = channels.into_iter().map(Into::into).collect();
        }
        service
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Queue a failure for the next creation call on `channel`
    ///
    /// A queued `Duplicate` also adds the channel, modelling a subscription
    /// made elsewhere after the destination was listed.
    pub fn fail_next(&self, channel: impl Into<ChannelId>, error: InsertError) {
        if let Ok(mut state) = self.state.lock() {
            state
                .scripted
                .entry(channel.into())
                .or_default()
                .push_back(error);
        }
    }

    /// Allow `calls` more creation calls before reporting quota exhaustion
    pub fn set_remote_quota(&self, calls: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.quota_left = Some(calls);
        }
    }

    /// Make listing fail as if the network were down
    pub fn set_list_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.list_unavailable = unavailable;
        }
    }

    /// Current subscriptions, in creation order
    pub fn subscriptions(&self) -> Vec<ChannelId> {
        self.state
            .lock()
            .map(|s| s.subscriptions.clone())
            .unwrap_or_default()
    }

    /// Channels passed to `create_subscription`, in call order
    pub fn create_calls(&self) -> Vec<ChannelId> {
        self.state
            .lock()
            .map(|s| s.create_calls.clone())
            .unwrap_or_default()
    }

    /// Number of page requests served
    pub fn list_calls(&self) -> usize {
        self.state.lock().map(|s| s.list_calls).unwrap_or(0)
    }
}

impl SubscriptionService for InMemorySubscriptionService {
    fn list_subscriptions(
        &self,
        page_token: Option<&str>,
    ) -> Result<SubscriptionPage, MigrationError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| MigrationError::RemoteUnavailable("lock poisoned".into()))?;
        state.list_calls += 1;
        if state.list_unavailable {
            return Err(MigrationError::RemoteUnavailable(
                "connection refused".into(),
            ));
        }

        let start = match page_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                MigrationError::RemoteUnavailable(format!("invalid page token {token}"))
            })?,
            None => 0,
        };
        let end = (start + self.page_size).min(state.subscriptions.len());
        let items = state.subscriptions.get(start..end).unwrap_or_default().to_vec();
        let next_page_token = (end < state.subscriptions.len()).then(|| end.to_string());

        Ok(SubscriptionPage {
            items,
            next_page_token,
            total_results: u32::try_from(state.subscriptions.len()).ok(),
        })
    }

    fn create_subscription(&self, channel: &ChannelId) -> Result<(), InsertError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| InsertError::Fatal("lock poisoned".into()))?;
        state.create_calls.push(channel.clone());

        if state.quota_left == Some(0) {
            return Err(InsertError::QuotaExceeded("quotaExceeded".into()));
        }
        if let Some(left) = state.quota_left.as_mut() {
            *left -= 1;
        }

        if let Some(error) = state
            .scripted
            .get_mut(channel)
            .and_then(VecDeque::pop_front)
        {
            // A duplicate means the remote already holds the subscription
            if matches!(error, InsertError::Duplicate(_)) && !state.subscriptions.contains(channel) {
                state.subscriptions.push(channel.clone());
            }
            return Err(error);
        }
        if state.subscriptions.contains(channel) {
            return Err(InsertError::Duplicate("subscriptionDuplicate".into()));
        }

        state.subscriptions.push(channel.clone());
        Ok(())
    }
}
