//! App-level configuration for the Google provider.
//!
//! User-provided OAuth credentials stored at:
//!   ~/.config/glowstatus/google/app_config.toml

use std::path::PathBuf;

use glowstatus_core::CalendarError;
use serde::{Deserialize, Serialize};

/// Google OAuth client credentials (user-provided).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

pub fn base_dir() -> Result<PathBuf, CalendarError> {
    Ok(dirs::config_dir()
        .ok_or_else(|| CalendarError::Session("Could not determine config directory".into()))?
        .join("glowstatus")
        .join("google"))
}

pub fn load() -> Result<Credentials, CalendarError> {
    let path = base_dir()?.join("app_config.toml");

    if !path.exists() {
        return Err(CalendarError::Auth(format!(
            "Google credentials not found.\n\n\
            Create {} with:\n\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"\n\n\
            See https://console.cloud.google.com/apis/credentials for setup.",
            path.display()
        )));
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        CalendarError::Session(format!("Failed to read credentials from {}: {e}", path.display()))
    })?;

    let creds: Credentials = toml::from_str(&contents).map_err(|e| {
        CalendarError::Session(format!(
            "Failed to parse credentials from {}: {e}",
            path.display()
        ))
    })?;

    Ok(creds)
}
