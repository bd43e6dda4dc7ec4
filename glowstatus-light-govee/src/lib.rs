//! Govee cloud device client for glowstatus.
//!
//! Wraps the Govee developer API's device-control endpoint. Every failure
//! surfaces as a typed [`DeviceError`]; the dispatcher logs it and retries
//! on the next tick, so nothing here may panic or block forever.
//!
//! [`DeviceError`]: glowstatus_core::DeviceError

use std::time::Duration;

use glowstatus_core::{DeviceError, LightCommand, Rgb};
use serde::Serialize;
use tracing::{debug, info};

const CONTROL_URL: &str = "https://developer-api.govee.com/v1/devices/control";

/// The Govee cloud rate-limits aggressively; keep requests short-lived.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between steps of the light test cycle, generous enough to stay
/// under the device rate limit.
pub const TEST_CYCLE_STEP: Duration = Duration::from_secs(10);

/// Palette cycled by the light test.
pub const TEST_CYCLE_COLORS: [Rgb; 5] = [
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(0, 0, 255),
    Rgb::new(255, 255, 0),
    Rgb::new(255, 255, 255),
];

/// Client for one Govee device. Cheap to clone; clones share the
/// underlying HTTP connection pool.
#[derive(Clone)]
pub struct GoveeClient {
    api_key: String,
    device_id: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ControlRequest<'a> {
    device: &'a str,
    model: &'a str,
    cmd: Cmd,
}

#[derive(Serialize)]
struct Cmd {
    name: &'static str,
    value: serde_json::Value,
}

impl GoveeClient {
    pub fn new(api_key: &str, device_id: &str, model: &str) -> Result<Self, DeviceError> {
        if api_key.is_empty() || device_id.is_empty() || model.is_empty() {
            return Err(DeviceError::NotConfigured);
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DeviceError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(GoveeClient {
            api_key: api_key.to_string(),
            device_id: device_id.to_string(),
            model: model.to_string(),
            http,
        })
    }

    /// Set the device color.
    pub async fn set_color(&self, color: Rgb) -> Result<(), DeviceError> {
        self.control(Cmd {
            name: "color",
            value: serde_json::json!({ "r": color.r, "g": color.g, "b": color.b }),
        })
        .await?;
        info!(%color, "govee color set");
        Ok(())
    }

    /// Turn the device on or off.
    pub async fn set_power(&self, on: bool) -> Result<(), DeviceError> {
        self.control(Cmd {
            name: "turn",
            value: serde_json::json!(if on { "on" } else { "off" }),
        })
        .await?;
        info!(on, "govee power set");
        Ok(())
    }

    /// Apply a resolved light command: power on + color, or power off.
    pub async fn apply(&self, command: LightCommand) -> Result<(), DeviceError> {
        match command {
            LightCommand::On { color } => {
                self.set_power(true).await?;
                self.set_color(color).await
            }
            LightCommand::Off => self.set_power(false).await,
        }
    }

    async fn control(&self, cmd: Cmd) -> Result<(), DeviceError> {
        let payload = ControlRequest {
            device: &self.device_id,
            model: &self.model,
            cmd,
        };

        debug!(device = %self.device_id, "sending govee control request");

        let response = self
            .http
            .put(CONTROL_URL)
            .header("Govee-API-Key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeviceError::Http(format!("Govee request timed out: {e}"))
                } else {
                    DeviceError::Http(format!("Govee request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeviceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_missing_configuration() {
        assert!(matches!(
            GoveeClient::new("", "10:00:D7:C1:83:46:65:8C", "H6159"),
            Err(DeviceError::NotConfigured)
        ));
        assert!(matches!(
            GoveeClient::new("key", "", "H6159"),
            Err(DeviceError::NotConfigured)
        ));
        assert!(matches!(
            GoveeClient::new("key", "10:00:D7:C1:83:46:65:8C", ""),
            Err(DeviceError::NotConfigured)
        ));
    }

    #[test]
    fn test_control_payload_shape() {
        let payload = ControlRequest {
            device: "10:00:D7:C1:83:46:65:8C",
            model: "H6159",
            cmd: Cmd {
                name: "color",
                value: serde_json::json!({ "r": 255, "g": 0, "b": 0 }),
            },
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["device"], "10:00:D7:C1:83:46:65:8C");
        assert_eq!(json["model"], "H6159");
        assert_eq!(json["cmd"]["name"], "color");
        assert_eq!(json["cmd"]["value"]["r"], 255);
    }
}
