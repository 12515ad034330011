//! Configuration loading for migrations
//!
//! OAuth client secrets are loaded from (in order of priority):
//! 1. An explicitly configured JSON file (Google Cloud Console format)
//! 2. Compile-time embedded credentials (for distributed builds)
//! 3. `client_secrets.json` in the subshift config directory
//! 4. Runtime environment variables
//!
//! Migration settings come from `subshift.json` in the config directory;
//! every field is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::MigrationError;
use crate::sync::SyncOptions;

/// Client secrets filename in the config directory
const CLIENT_SECRETS_FILE: &str = "client_secrets.json";

/// Settings filename in the config directory
pub const SETTINGS_FILE: &str = "subshift.json";

/// OAuth client credentials for the YouTube Data API
#[derive(Debug, Clone)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

/// Google Cloud Console credential file format
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<InstalledCredentials>,
    web: Option<InstalledCredentials>,
}

#[derive(Deserialize)]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
}

impl ClientSecrets {
    /// Load client secrets, preferring `explicit` when given
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(creds) = Self::from_compile_time() {
            return Ok(creds);
        }

        if config::config_exists(CLIENT_SECRETS_FILE) {
            let creds: GoogleCredentialFile = config::load_json(CLIENT_SECRETS_FILE)?;
            return Self::from_credential_file(creds);
        }

        Self::from_env()
    }

    /// Credentials embedded at build time via
    /// `YOUTUBE_CLIENT_ID=xxx YOUTUBE_CLIENT_SECRET=yyy cargo build --release`
    pub fn from_compile_time() -> Option<Self> {
        let client_id = option_env!("YOUTUBE_CLIENT_ID")?;
        let client_secret = option_env!("YOUTUBE_CLIENT_SECRET")?;

        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }

        Some(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: GoogleCredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(creds)
    }

    fn from_credential_file(creds: GoogleCredentialFile) -> Result<Self> {
        // Support both "installed" (desktop) and "web" credential types
        let installed = creds
            .installed
            .or(creds.web)
            .context("Credentials file missing 'installed' or 'web' section")?;

        Ok(Self {
            client_id: installed.client_id,
            client_secret: installed.client_secret,
        })
    }

    /// Parse credentials from JSON string (Google Cloud Console format)
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(creds)
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("YOUTUBE_CLIENT_ID")
            .context("YOUTUBE_CLIENT_ID environment variable not set")?;
        let client_secret = std::env::var("YOUTUBE_CLIENT_SECRET")
            .context("YOUTUBE_CLIENT_SECRET environment variable not set")?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// Default client secrets location in the config directory
    pub fn default_path() -> Option<PathBuf> {
        config::config_path(CLIENT_SECRETS_FILE)
    }
}

/// Which side of the migration an account is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Source,
    Destination,
}

impl AccountRole {
    fn token_file(self) -> &'static str {
        match self {
            AccountRole::Source => "youtube-tokens-source.json",
            AccountRole::Destination => "youtube-tokens-destination.json",
        }
    }
}

/// Adjustable migration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Google OAuth client secrets file
    pub client_secrets_file: Option<PathBuf>,
    /// Maximum creation calls per calendar day
    pub daily_limit: u32,
    /// Seconds to wait between creation calls
    pub pacing_secs: u64,
    /// Exported channel list
    pub source_list: PathBuf,
    /// Persisted progress record
    pub progress_file: PathBuf,
    /// Token cache for the source account
    pub source_token_file: Option<PathBuf>,
    /// Token cache for the destination account
    pub destination_token_file: Option<PathBuf>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            client_secrets_file: None,
            daily_limit: SyncOptions::DEFAULT_DAILY_LIMIT,
            pacing_secs: SyncOptions::DEFAULT_PACING.as_secs(),
            source_list: PathBuf::from("subscriptions.txt"),
            progress_file: PathBuf::from("subscription_count.txt"),
            source_token_file: None,
            destination_token_file: None,
        }
    }
}

impl MigrationConfig {
    /// Load `subshift.json` from the config directory, or defaults if absent
    pub fn load() -> Result<Self> {
        if config::config_exists(SETTINGS_FILE) {
            return config::load_json(SETTINGS_FILE);
        }
        Ok(Self::default())
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Check values once at startup
    pub fn validate(&self) -> Result<(), MigrationError> {
        if self.daily_limit == 0 {
            return Err(MigrationError::Config(
                "daily_limit must be a positive integer".into(),
            ));
        }
        if self.source_list.as_os_str().is_empty() {
            return Err(MigrationError::Config("source_list path is empty".into()));
        }
        if self.progress_file.as_os_str().is_empty() {
            return Err(MigrationError::Config("progress_file path is empty".into()));
        }
        Ok(())
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            daily_limit: self.daily_limit,
            pacing_delay: Duration::from_secs(self.pacing_secs),
        }
    }

    /// Token cache path for one side of the migration
    pub fn token_path(&self, role: AccountRole) -> Result<PathBuf> {
        let configured = match role {
            AccountRole::Source => &self.source_token_file,
            AccountRole::Destination => &self.destination_token_file,
        };
        if let Some(path) = configured {
            return Ok(path.clone());
        }
        config::config_path(role.token_file()).context("Could not determine config directory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_credentials() {
        let json = r#"{
            "installed": {
                "client_id": "test-client-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token"
            }
        }"#;

        let creds = ClientSecrets::from_json(json).unwrap();
        assert_eq!(creds.client_id, "test-client-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
    }

    #[test]
    fn test_parse_web_credentials() {
        let json = r#"{
            "web": {
                "client_id": "web-client-id.apps.googleusercontent.com",
                "client_secret": "web-secret"
            }
        }"#;

        let creds = ClientSecrets::from_json(json).unwrap();
        assert_eq!(creds.client_id, "web-client-id.apps.googleusercontent.com");
    }

    #[test]
    fn test_invalid_json() {
        assert!(ClientSecrets::from_json(r#"{ "other": {} }"#).is_err());
    }

    #[test]
    fn test_explicit_secrets_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(&path, r#"{"installed": {"client_id": "file-id", "client_secret": "s"}}"#)
            .unwrap();

        let creds = ClientSecrets::load(Some(&path)).unwrap();
        assert_eq!(creds.client_id, "file-id");
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subshift.json");
        std::fs::write(&path, r#"{"daily_limit": 120, "pacing_secs": 10}"#).unwrap();

        let config = MigrationConfig::from_file(&path).unwrap();

        assert_eq!(config.daily_limit, 120);
        assert_eq!(config.pacing_secs, 10);
        assert_eq!(config.source_list, PathBuf::from("subscriptions.txt"));
        assert_eq!(config.progress_file, PathBuf::from("subscription_count.txt"));
        assert_eq!(
            config.sync_options().pacing_delay,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let config = MigrationConfig {
            daily_limit: 0,
            ..MigrationConfig::default()
        };
        assert!(matches!(config.validate(), Err(MigrationError::Config(_))));
        assert!(MigrationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_configured_token_path() {
        let config = MigrationConfig {
            destination_token_file: Some(PathBuf::from("/tmp/dest.json")),
            ..MigrationConfig::default()
        };
        assert_eq!(
            config.token_path(AccountRole::Destination).unwrap(),
            PathBuf::from("/tmp/dest.json")
        );
    }

    #[test]
    fn test_token_files_differ_per_role() {
        assert_ne!(
            AccountRole::Source.token_file(),
            AccountRole::Destination.token_file()
        );
    }
}
