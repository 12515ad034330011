//! YouTube Data API HTTP client
//!
//! Lists and creates subscriptions for the authenticated account.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use log::debug;
use std::time::Duration;
use url::Url;

use super::YoutubeAuth;
use super::api::{ErrorResponse, ResourceId, Subscription, SubscriptionListResponse, SubscriptionSnippet};
use crate::error::MigrationError;
use crate::models::ChannelId;
use crate::service::{InsertError, SubscriptionPage, SubscriptionService};

/// YouTube API client bound to one account
pub struct YoutubeClient {
    auth: YoutubeAuth,
    agent: ureq::Agent,
}

impl YoutubeClient {
    const SUBSCRIPTIONS_URL: &'static str = "https://www.googleapis.com/youtube/v3/subscriptions";

    /// Server page size for listing
    pub const PAGE_SIZE: u32 = 50;

    const TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(auth: YoutubeAuth) -> Self {
        // Error statuses are returned as responses so their bodies can be classified
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Self::TIMEOUT))
            .build()
            .into();
        Self { auth, agent }
    }

    /// Trigger authentication flow
    pub fn authenticate(&self) -> anyhow::Result<()> {
        self.auth.get_access_token()?;
        Ok(())
    }

    pub fn auth(&self) -> &YoutubeAuth {
        &self.auth
    }

    fn list_url(page_token: Option<&str>) -> Result<Url, MigrationError> {
        let max_results = Self::PAGE_SIZE.to_string();
        let mut url = Url::parse_with_params(
            Self::SUBSCRIPTIONS_URL,
            [
                ("part", "snippet"),
                ("mine", "true"),
                ("maxResults", max_results.as_str()),
            ],
        )
        .map_err(|e| MigrationError::RemoteUnavailable(format!("invalid list URL: {e}")))?;

        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("pageToken", token);
        }
        Ok(url)
    }
}

impl SubscriptionService for YoutubeClient {
    fn list_subscriptions(
        &self,
        page_token: Option<&str>,
    ) -> Result<SubscriptionPage, MigrationError> {
        let access_token = self
            .auth
            .get_access_token()
            .map_err(|e| MigrationError::Credential(format!("{e:#}")))?;
        let url = Self::list_url(page_token)?;

        let mut response = self
            .agent
            .get(url.as_str())
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .map_err(|e| {
                MigrationError::RemoteUnavailable(format!("list subscriptions request failed: {e}"))
            })?;

        let status = response.status().as_u16();
        if status == 401 {
            return Err(MigrationError::Credential(
                "access token rejected while listing subscriptions".into(),
            ));
        }
        if !(200..300).contains(&status) {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(MigrationError::RemoteUnavailable(format!(
                "list subscriptions returned HTTP {status}: {}",
                error_summary(&body)
            )));
        }

        let list: SubscriptionListResponse = response.body_mut().read_json().map_err(|e| {
            MigrationError::RemoteUnavailable(format!("failed to parse subscription list: {e}"))
        })?;

        Ok(SubscriptionPage {
            items: list
                .items
                .into_iter()
                .filter_map(|s| s.snippet.resource_id.channel_id)
                .map(ChannelId::from)
                .collect(),
            next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
            total_results: list.page_info.and_then(|p| p.total_results),
        })
    }

    fn create_subscription(&self, channel: &ChannelId) -> Result<(), InsertError> {
        let access_token = self
            .auth
            .get_access_token()
            .map_err(|e| InsertError::Fatal(format!("no access token: {e:#}")))?;

        let body = Subscription {
            id: None,
            snippet: SubscriptionSnippet {
                title: None,
                resource_id: ResourceId {
                    kind: "youtube#channel".to_string(),
                    channel_id: Some(channel.as_str().to_string()),
                },
            },
        };

        let url = format!("{}?part=snippet", Self::SUBSCRIPTIONS_URL);
        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .send_json(&body)
            .map_err(|e| InsertError::Transient(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(());
        }

        let body = response.body_mut().read_to_string().unwrap_or_default();
        debug!("Subscription insert for {channel} returned HTTP {status}: {body}");
        Err(classify_insert_failure(status, &body))
    }
}

/// Map a failed insert response onto the tagged failure kinds
///
/// Google reports the cause in `error.errors[].reason`; the status code
/// alone does not separate duplicates from other bad requests.
pub fn classify_insert_failure(status: u16, body: &str) -> InsertError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let reasons: Vec<&str> = parsed
        .as_ref()
        .map(|r| r.error.errors.iter().map(|e| e.reason.as_str()).collect())
        .unwrap_or_default();
    let detail = format!("HTTP {status}: {}", error_summary(body));

    if reasons.contains(&"subscriptionDuplicate") {
        InsertError::Duplicate(detail)
    } else if reasons
        .iter()
        .any(|r| matches!(*r, "quotaExceeded" | "dailyLimitExceeded"))
    {
        InsertError::QuotaExceeded(detail)
    } else if status == 401 {
        InsertError::Fatal(detail)
    } else {
        InsertError::Transient(detail)
    }
}

/// Short human-readable description of an error body
fn error_summary(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => {
            let reasons: Vec<&str> = response
                .error
                .errors
                .iter()
                .map(|e| e.reason.as_str())
                .filter(|r| !r.is_empty())
                .collect();
            if reasons.is_empty() {
                response.error.message
            } else {
                format!("{} ({})", response.error.message, reasons.join(", "))
            }
        }
        Err(_) => body.chars().take(200).collect(),
    }
}
