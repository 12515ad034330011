//! YouTube Data API integration
//!
//! This module provides:
//! - OAuth2 authentication flow with per-account token files
//! - YouTube API client for listing and creating subscriptions
//! - Classification of creation failures into [`InsertError`](crate::service::InsertError)

mod auth;
mod client;

pub use auth::{Scope, YoutubeAuth, remove_token_file};
pub use client::{YoutubeClient, classify_insert_failure};

/// YouTube API response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing subscriptions
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SubscriptionListResponse {
        #[serde(default)]
        pub items: Vec<Subscription>,
        pub next_page_token: Option<String>,
        pub page_info: Option<PageInfo>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageInfo {
        pub total_results: Option<u32>,
        pub results_per_page: Option<u32>,
    }

    /// A subscription resource
    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Subscription {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub id: Option<String>,
        pub snippet: SubscriptionSnippet,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SubscriptionSnippet {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub title: Option<String>,
        pub resource_id: ResourceId,
    }

    /// The followed entity
    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResourceId {
        pub kind: String,
        pub channel_id: Option<String>,
    }

    /// Error envelope returned with non-2xx responses
    #[derive(Debug, Deserialize)]
    pub struct ErrorResponse {
        pub error: ErrorBody,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorBody {
        pub code: Option<u16>,
        #[serde(default)]
        pub message: String,
        #[serde(default)]
        pub errors: Vec<ErrorItem>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorItem {
        #[serde(default)]
        pub reason: String,
        pub message: Option<String>,
    }
}
