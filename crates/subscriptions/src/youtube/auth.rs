//! YouTube OAuth2 authentication
//!
//! Implements the installed-app authorization code flow. A loopback HTTP
//! listener receives the callback; tokens are cached per account in a JSON
//! file and refreshed when they expire.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};

use crate::config::ClientSecrets;

/// OAuth scope requested for an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Enough to list subscriptions (source account)
    ReadOnly,
    /// Needed to create subscriptions (destination account)
    Manage,
}

impl Scope {
    pub fn url(self) -> &'static str {
        match self {
            Scope::ReadOnly => "https://www.googleapis.com/auth/youtube.readonly",
            Scope::Manage => "https://www.googleapis.com/auth/youtube",
        }
    }
}

/// OAuth2 configuration and token management for one YouTube account
pub struct YoutubeAuth {
    client_id: String,
    client_secret: String,
    scope: Scope,
    token_path: PathBuf,
}

/// Stored token data
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    #[allow(dead_code)]
    token_type: String,
}

impl YoutubeAuth {
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Port range to try for local OAuth callback server
    const PORT_RANGE_START: u16 = 8080;
    const PORT_RANGE_END: u16 = 8090;

    /// Seconds before expiry at which a cached token is considered stale
    const EXPIRY_MARGIN_SECS: i64 = 300;

    /// Create a new YoutubeAuth instance
    ///
    /// # Arguments
    /// * `secrets` - OAuth2 client from Google Cloud Console
    /// * `scope` - Access level to request
    /// * `token_path` - Where this account's tokens are cached
    pub fn new(secrets: &ClientSecrets, scope: Scope, token_path: impl Into<PathBuf>) -> Self {
        Self {
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            scope,
            token_path: token_path.into(),
        }
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Get a valid access token, refreshing or re-authenticating as needed
    pub fn get_access_token(&self) -> Result<String> {
        if let Ok(token) = self.load_token() {
            // A token granted for a narrower scope cannot be reused
            let scope_matches = token
                .scope
                .as_deref()
                .is_none_or(|s| s.split_whitespace().any(|s| s == self.scope.url()));

            if scope_matches {
                if let Some(expires_at) = token.expires_at {
                    let now = chrono::Utc::now().timestamp();
                    if expires_at > now + Self::EXPIRY_MARGIN_SECS {
                        return Ok(token.access_token);
                    }
                }

                if let Some(refresh_token) = token.refresh_token {
                    match self.refresh_access_token(&refresh_token) {
                        Ok(new_token) => {
                            self.save_token_response(&new_token)?;
                            return Ok(new_token.access_token);
                        }
                        Err(e) => warn!("Token refresh failed, re-authenticating: {e:#}"),
                    }
                }
            }
        }

        let token = self.authorization_code_auth()?;
        self.save_token_response(&token)?;
        Ok(token.access_token)
    }

    /// Perform authorization code flow authentication
    fn authorization_code_auth(&self) -> Result<TokenResponse> {
        let (listener, port) = self.start_local_server()?;
        let redirect_uri = format!("http://localhost:{}", port);

        let auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            Self::AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&redirect_uri),
            urlencoding::encode(self.scope.url()),
        );

        println!("\n=== YouTube Authentication Required ===");
        println!("Sign in with the account for {}", self.token_path.display());
        println!("If the browser doesn't open, visit: {}", auth_url);

        if let Err(e) = open::that(&auth_url) {
            eprintln!("Failed to open browser: {}. Please open the URL manually.", e);
        }

        println!("Waiting for authorization...");
        let code = self.wait_for_callback(listener)?;

        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .context("Failed to exchange authorization code")?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")?;

        info!("Authentication successful");
        Ok(token)
    }

    /// Start a local TCP server on an available port
    fn start_local_server(&self) -> Result<(TcpListener, u16)> {
        for port in Self::PORT_RANGE_START..=Self::PORT_RANGE_END {
            if let Ok(listener) = TcpListener::bind(format!("127.0.0.1:{}", port)) {
                return Ok((listener, port));
            }
        }
        anyhow::bail!(
            "Could not bind to any port in range {}-{}",
            Self::PORT_RANGE_START,
            Self::PORT_RANGE_END
        )
    }

    /// Wait for OAuth callback and extract authorization code
    fn wait_for_callback(&self, listener: TcpListener) -> Result<String> {
        let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .context("Failed to read request")?;

        let (code, error) = parse_callback(&request_line);

        let (status, body) = if code.is_some() {
            ("200 OK", "Authentication successful! You can close this window.")
        } else {
            ("400 Bad Request", "Authentication failed. Please try again.")
        };

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
            status, body
        );
        stream.write_all(response.as_bytes()).ok();

        if let Some(err) = error {
            anyhow::bail!("OAuth error: {}", err);
        }

        code.context("No authorization code received")
    }

    /// Refresh an access token using a refresh token
    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .context("Failed to refresh access token")?;

        let mut token: TokenResponse = response
            .into_body()
            .read_json()
            .context("Failed to parse refresh token response")?;

        // Preserve the refresh token if not returned
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }

        Ok(token)
    }

    fn load_token(&self) -> Result<StoredToken> {
        let content = fs::read_to_string(&self.token_path)?;
        let token: StoredToken = serde_json::from_str(&content)?;
        Ok(token)
    }

    fn save_token_response(&self, token: &TokenResponse) -> Result<()> {
        let stored = StoredToken {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at: token
                .expires_in
                .map(|d| chrono::Utc::now().timestamp() + d as i64),
            scope: Some(self.scope.url().to_string()),
        };

        config::save_json_file(&self.token_path, &stored)
    }

    /// Clear stored tokens (logout)
    pub fn logout(&self) -> Result<()> {
        remove_token_file(&self.token_path)
    }
}

/// Delete a token cache file; a missing file is not an error
///
/// Needs no client secrets, so an account can be signed out even when
/// credentials are no longer configured.
pub fn remove_token_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e)
            .with_context(|| format!("Failed to remove token file: {}", path.display())),
    }
}

/// Extract `code` and `error` query parameters from the callback request line
///
/// Format: `GET /?code=AUTH_CODE&scope=... HTTP/1.1`
fn parse_callback(request_line: &str) -> (Option<String>, Option<String>) {
    let Some(query) = request_line
        .split_whitespace()
        .nth(1)
        .and_then(|path| path.split_once('?').map(|(_, q)| q))
    else {
        return (None, None);
    };

    let param = |name: &str| {
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| {
                urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string())
            })
        })
    };

    (param("code"), param("error"))
}
