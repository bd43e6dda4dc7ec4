//! Global glowstatus configuration.
//!
//! One TOML document at `~/.config/glowstatus/config.toml`, read at startup
//! and on explicit reload. Malformed rule entries degrade to built-in
//! defaults instead of blocking startup.

use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{
    DEFAULT_LEAD_WINDOW_SECS, DEFAULT_OVERRIDE_EXPIRY_SECS, DEFAULT_REFRESH_INTERVAL_SECS,
    MIN_REFRESH_INTERVAL_SECS,
};
use crate::error::{GlowError, GlowResult};
use crate::resolver::ResolvePolicy;
use crate::status::{Rgb, StatusRule, StatusRules, WHITE};

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_lead_window() -> u64 {
    DEFAULT_LEAD_WINDOW_SECS
}

fn default_override_expiry() -> u64 {
    DEFAULT_OVERRIDE_EXPIRY_SECS
}

/// Global configuration at ~/.config/glowstatus/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlowConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_lead_window")]
    pub lead_window_secs: u64,

    #[serde(default = "default_override_expiry")]
    pub override_expiry_secs: u64,

    #[serde(default)]
    pub power_off_when_available: bool,

    #[serde(default)]
    pub off_for_unknown_status: bool,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub govee: GoveeConfig,

    /// Ordered keyword rules. TOML array-of-tables order is preserved, and
    /// that order is the matching priority.
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

/// Calendar collaborator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Calendar to poll, e.g. "primary" or an address.
    pub id: Option<String>,
    /// The authenticated account the OAuth session belongs to.
    pub account: Option<String>,
}

impl CalendarConfig {
    /// Sync may only be enabled with a calendar and an account configured;
    /// the caller supplies whether an OAuth session actually exists.
    pub fn can_enable_sync(&self, has_session: bool) -> bool {
        self.id.as_deref().is_some_and(|s| !s.is_empty())
            && self.account.as_deref().is_some_and(|s| !s.is_empty())
            && has_session
    }
}

/// Govee collaborator settings. The API key can live in the environment
/// instead of the config file; the environment wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoveeConfig {
    pub device_id: Option<String>,
    pub device_model: Option<String>,
    pub api_key: Option<String>,
}

pub const GOVEE_API_KEY_ENV: &str = "GOVEE_API_KEY";

impl GoveeConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(GOVEE_API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
    }

    /// Device IDs look like `10:00:D7:C1:83:46:65:8C`.
    pub fn device_id_valid(&self) -> bool {
        match &self.device_id {
            Some(id) => {
                let parts: Vec<&str> = id.split(':').collect();
                parts.len() == 8
                    && parts
                        .iter()
                        .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
            }
            None => false,
        }
    }

    pub fn can_enable_lights(&self) -> bool {
        self.device_id_valid()
            && self.device_model.as_deref().is_some_and(|m| !m.is_empty())
            && self.api_key().is_some()
    }
}

/// A rule entry as written in the config file. The color stays a string
/// here so one bad entry degrades alone instead of failing the whole parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRule {
    pub keyword: String,
    pub color: String,
    #[serde(default)]
    pub power_off: bool,
}

impl GlowConfig {
    pub fn config_path() -> GlowResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| GlowError::Config("Could not determine config directory".into()))?
            .join("glowstatus");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default path. A missing file yields defaults.
    pub fn load() -> GlowResult<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(GlowConfig::default_document());
        }

        let contents = std::fs::read_to_string(&path)?;
        Self::parse(&contents)
    }

    /// Load, degrading to defaults on any error. Configuration problems
    /// must never block startup.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Falling back to default configuration: {e}");
                GlowConfig::default_document()
            }
        }
    }

    pub fn parse(contents: &str) -> GlowResult<Self> {
        toml::from_str(contents).map_err(|e| GlowError::Config(e.to_string()))
    }

    /// Save to the default path.
    pub fn save(&self) -> GlowResult<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| GlowError::Serialization(e.to_string()))?;
        std::fs::write(&path, contents)?;

        Ok(())
    }

    /// A config with the built-in rule table spelled out, so a first save
    /// gives the user something to edit.
    pub fn default_document() -> Self {
        let rules = StatusRules::default()
            .rules()
            .iter()
            .map(|r| RawRule {
                keyword: r.keyword.clone(),
                color: r.color.to_string(),
                power_off: r.power_off,
            })
            .collect();

        GlowConfig {
            refresh_interval_secs: default_refresh_interval(),
            lead_window_secs: default_lead_window(),
            override_expiry_secs: default_override_expiry(),
            rules,
            ..GlowConfig::default()
        }
    }

    /// The validated rule table. Entries with malformed colors fall back to
    /// the built-in color for that keyword (white if unknown) with a
    /// warning; an empty table falls back to the defaults wholesale.
    pub fn status_rules(&self) -> StatusRules {
        if self.rules.is_empty() {
            return StatusRules::default();
        }

        let builtin = StatusRules::default();
        let rules = self
            .rules
            .iter()
            .map(|raw| {
                let color = raw.color.parse::<Rgb>().unwrap_or_else(|e| {
                    let fallback = builtin
                        .by_tag(&raw.keyword)
                        .map(|r| r.color)
                        .unwrap_or(WHITE);
                    warn!(keyword = %raw.keyword, "{e}; using {fallback}");
                    fallback
                });
                StatusRule::new(&raw.keyword, color, raw.power_off)
            })
            .collect();

        StatusRules::new(rules)
    }

    /// Refresh interval with the runtime floor applied. The file may carry
    /// smaller values for backwards compatibility.
    pub fn effective_refresh_interval(&self) -> u64 {
        self.refresh_interval_secs.max(MIN_REFRESH_INTERVAL_SECS)
    }

    pub fn lead_window(&self) -> Duration {
        Duration::seconds(self.lead_window_secs as i64)
    }

    pub fn override_expiry(&self) -> Duration {
        Duration::seconds(self.override_expiry_secs as i64)
    }

    pub fn resolve_policy(&self) -> ResolvePolicy {
        ResolvePolicy {
            lead_window: self.lead_window(),
            override_expiry: self.override_expiry(),
            power_off_when_available: self.power_off_when_available,
            off_for_unknown_status: self.off_for_unknown_status,
        }
    }
}
