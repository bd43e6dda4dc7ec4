//! Stored Google OAuth session, refreshed lazily when expired.
//!
//! The consent flow itself lives outside this crate; we consume its output
//! (access + refresh tokens) as an opaque, refreshable session file.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use glowstatus_core::CalendarError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app_config;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

pub struct Session {
    account: String,
    data: SessionData,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: String,
}

impl Session {
    fn path_for_account(account: &str) -> Result<PathBuf, CalendarError> {
        let slug = account.replace(['/', '\\', ':'], "_");

        Ok(app_config::base_dir()?
            .join("session")
            .join(format!("{slug}.toml")))
    }

    /// Whether a stored session exists for this account. Sync cannot be
    /// enabled without one.
    pub fn exists(account: &str) -> bool {
        Self::path_for_account(account)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    /// Load a session and refresh it if expired.
    pub async fn load_valid(account: &str) -> Result<Self, CalendarError> {
        let mut session = Self::load(account)?;

        if session.is_expired() {
            debug!(account, "access token expired, refreshing");
            session.refresh().await?;
        }

        Ok(session)
    }

    fn load(account: &str) -> Result<Self, CalendarError> {
        let path = Self::path_for_account(account)?;

        if !path.exists() {
            return Err(CalendarError::Auth(format!(
                "Google OAuth session for {account} not found. Authenticate first."
            )));
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            CalendarError::Session(format!("Failed to read session from {}: {e}", path.display()))
        })?;

        let data: SessionData = toml::from_str(&contents).map_err(|e| {
            CalendarError::Session(format!(
                "Failed to parse session from {}: {e}",
                path.display()
            ))
        })?;

        Ok(Session {
            account: account.to_string(),
            data,
        })
    }

    pub fn save(&self) -> Result<(), CalendarError> {
        let contents = toml::to_string_pretty(&self.data)
            .map_err(|e| CalendarError::Session(format!("Failed to serialize session: {e}")))?;

        let path = Self::path_for_account(&self.account)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalendarError::Session(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        std::fs::write(&path, contents).map_err(|e| {
            CalendarError::Session(format!("Failed to write session to {}: {e}", path.display()))
        })?;

        // Owner-only (0600) since the file contains OAuth tokens:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).map_err(
                |e| {
                    CalendarError::Session(format!(
                        "Failed to set permissions on {}: {e}",
                        path.display()
                    ))
                },
            )?;
        }

        Ok(())
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.data.expires_at
    }

    async fn refresh(&mut self) -> Result<(), CalendarError> {
        let creds = app_config::load()?;

        let client = reqwest::Client::new();
        let response = client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("refresh_token", self.data.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| CalendarError::Network(format!("Token refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // 400 invalid_grant means the refresh token was revoked or
            // expired; re-authentication is the only way out.
            if status.as_u16() == 400 || status.as_u16() == 401 {
                return Err(CalendarError::Auth(format!(
                    "Token refresh rejected (HTTP {status}): {body}"
                )));
            }
            return Err(CalendarError::Network(format!(
                "Token refresh failed (HTTP {status}): {body}"
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Network(format!("Invalid token refresh response: {e}")))?;

        self.data.access_token = refreshed.access_token;
        self.data.expires_at = Utc::now() + Duration::seconds(refreshed.expires_in);
        // Google typically doesn't return a new refresh_token on refresh
        if !refreshed.refresh_token.is_empty() {
            self.data.refresh_token = refreshed.refresh_token;
        }
        self.save()?;

        Ok(())
    }
}
