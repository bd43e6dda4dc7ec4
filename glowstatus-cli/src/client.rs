//! HTTP client for communicating with glowstatusd

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::process::Command;
use std::time::Duration;

const DAEMON_URL: &str = "http://127.0.0.1:4123";
const MAX_RETRIES: u32 = 10;
const RETRY_DELAY_MS: u64 = 200;

/// HTTP client for glowstatusd
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

// Response types matching the daemon API

#[derive(Deserialize)]
pub struct StatusReport {
    pub status: Option<ResolvedStatus>,
    #[serde(rename = "override")]
    pub manual: Option<ManualOverride>,
    pub sync_enabled: bool,
    pub sync_degraded: bool,
    pub lights_enabled: bool,
    pub next_event: Option<NextEvent>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct ResolvedStatus {
    pub tag: String,
    pub source: String,
    pub color: Option<String>,
    pub power_off: bool,
}

#[derive(Deserialize)]
pub struct ManualOverride {
    pub tag: String,
    pub set_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct NextEvent {
    pub summary: String,
    pub start: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl Client {
    /// Connect to a running daemon or start one
    pub async fn connect() -> Result<Self> {
        let http = reqwest::Client::new();
        let client = Self {
            http,
            base_url: DAEMON_URL.to_string(),
        };

        // Try to connect to an existing daemon
        if client.health_check().await.is_ok() {
            return Ok(client);
        }

        // Daemon not running - start it
        start_daemon()?;

        // Wait for the daemon to be ready
        for _ in 0..MAX_RETRIES {
            tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
            if client.health_check().await.is_ok() {
                return Ok(client);
            }
        }

        anyhow::bail!("Failed to connect to glowstatusd after starting it")
    }

    async fn health_check(&self) -> Result<()> {
        self.http
            .get(format!("{}/status", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await?;
        Ok(())
    }

    /// GET /status
    pub async fn status(&self) -> Result<StatusReport> {
        let resp = self
            .http
            .get(format!("{}/status", self.base_url))
            .send()
            .await
            .context("Failed to connect to daemon")?;

        Self::parse(resp).await
    }

    /// PUT /override
    pub async fn set_override(&self, tag: &str) -> Result<StatusReport> {
        let resp = self
            .http
            .put(format!("{}/override", self.base_url))
            .json(&serde_json::json!({ "tag": tag }))
            .send()
            .await
            .context("Failed to connect to daemon")?;

        Self::parse(resp).await
    }

    /// DELETE /override
    pub async fn clear_override(&self) -> Result<StatusReport> {
        let resp = self
            .http
            .delete(format!("{}/override", self.base_url))
            .send()
            .await
            .context("Failed to connect to daemon")?;

        Self::parse(resp).await
    }

    /// PUT /sync
    pub async fn set_sync(&self, enabled: bool) -> Result<StatusReport> {
        let resp = self
            .http
            .put(format!("{}/sync", self.base_url))
            .json(&serde_json::json!({ "enabled": enabled }))
            .send()
            .await
            .context("Failed to connect to daemon")?;

        Self::parse(resp).await
    }

    /// PUT /lights
    pub async fn set_lights(&self, enabled: bool) -> Result<StatusReport> {
        let resp = self
            .http
            .put(format!("{}/lights", self.base_url))
            .json(&serde_json::json!({ "enabled": enabled }))
            .send()
            .await
            .context("Failed to connect to daemon")?;

        Self::parse(resp).await
    }

    /// POST /refresh
    pub async fn refresh(&self) -> Result<StatusReport> {
        let resp = self
            .http
            .post(format!("{}/refresh", self.base_url))
            .send()
            .await
            .context("Failed to connect to daemon")?;

        Self::parse(resp).await
    }

    /// POST /lights/test
    pub async fn test_lights(&self) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/lights/test", self.base_url))
            .send()
            .await
            .context("Failed to connect to daemon")?;

        if !resp.status().is_success() {
            let err: ErrorResponse = resp.json().await?;
            anyhow::bail!("{}", err.error);
        }
        Ok(())
    }

    async fn parse(resp: reqwest::Response) -> Result<StatusReport> {
        if !resp.status().is_success() {
            let err: ErrorResponse = resp.json().await?;
            anyhow::bail!("{}", err.error);
        }
        Ok(resp.json().await?)
    }
}

/// Start the glowstatusd process
fn start_daemon() -> Result<()> {
    Command::new("glowstatusd")
        .spawn()
        .context("Failed to start glowstatusd. Is it installed?")?;
    Ok(())
}
