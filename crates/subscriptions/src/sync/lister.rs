//! Full pagination over the account's subscriptions

use log::debug;
use std::collections::HashSet;

use crate::error::{MigrationError, Result};
use crate::models::ChannelId;
use crate::service::SubscriptionService;

/// List every subscription of the authenticated account
///
/// Follows the page cursor until the server stops returning one. Order is
/// enumeration order; repeated identifiers are dropped.
///
/// # Arguments
/// * `service` - Remote service bound to the account
/// * `progress_callback` - Called after each page with (fetched_count, total_estimate)
///
/// # Errors
/// Transport failures propagate unchanged; they are not retried here. A
/// cursor the server already returned is reported as `RemoteUnavailable`.
pub fn list_all_subscriptions<F>(
    service: &dyn SubscriptionService,
    mut progress_callback: F,
) -> Result<Vec<ChannelId>>
where
    F: FnMut(usize, Option<u32>),
{
    let mut channels = Vec::new();
    let mut seen: HashSet<ChannelId> = HashSet::new();
    let mut seen_tokens: HashSet<String> = HashSet::new();
    let mut page_token: Option<String> = None;
    let mut total_estimate = None;

    loop {
        let page = service.list_subscriptions(page_token.as_deref())?;

        if page.total_results.is_some() {
            total_estimate = page.total_results;
        }

        for channel in page.items {
            if seen.insert(channel.clone()) {
                channels.push(channel);
            } else {
                debug!("Skipping repeated channel {channel} in listing");
            }
        }

        progress_callback(channels.len(), total_estimate);

        match page.next_page_token {
            Some(token) => {
                if !seen_tokens.insert(token.clone()) {
                    return Err(MigrationError::RemoteUnavailable(format!(
                        "server repeated page token {token}"
                    )));
                }
                page_token = Some(token);
            }
            None => break,
        }
    }

    Ok(channels)
}

/// Snapshot of the destination account's subscriptions
pub fn destination_snapshot(service: &dyn SubscriptionService) -> Result<HashSet<ChannelId>> {
    let channels = list_all_subscriptions(service, |fetched, total| {
        debug!("Fetched {fetched}/{} destination subscriptions", total.unwrap_or(0));
    })?;
    Ok(channels.into_iter().collect())
}
