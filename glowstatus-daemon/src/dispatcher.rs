//! Light command dispatch with deduplication.
//!
//! Owns the last-successfully-sent command, the only state remembered
//! across ticks besides the manual override. Redundant device calls are
//! skipped outright: repeated power commands make real hardware flicker.

use glowstatus_core::{LightCommand, ResolvedStatus};
use glowstatus_light_govee::GoveeClient;
use tracing::{debug, info, warn};

pub struct Dispatcher {
    client: Option<GoveeClient>,
    enabled: bool,
    last_sent: Option<LightCommand>,
}

impl Dispatcher {
    pub fn new(client: Option<GoveeClient>, enabled: bool) -> Self {
        let enabled = enabled && client.is_some();
        Dispatcher {
            client,
            enabled,
            last_sent: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Push the resolved status to the device, unless it matches what the
    /// device already shows. Device failures are logged and retried on the
    /// next tick; they never propagate.
    pub async fn apply(&mut self, status: &ResolvedStatus) {
        if !self.enabled {
            return;
        }
        let command = status.light_command();
        if !self.should_send(command) {
            debug!(tag = %status.tag, "light already reflects status, skipping dispatch");
            return;
        }
        self.send(command).await;
    }

    /// Enable or disable light control. Disabling turns the light off
    /// immediately rather than waiting for the next tick; re-enabling
    /// forgets the cache so the current status is re-dispatched.
    pub async fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        if enabled {
            self.enabled = self.client.is_some();
            self.last_sent = None;
            info!("light control enabled");
        } else {
            if self.should_send(LightCommand::Off) {
                self.send(LightCommand::Off).await;
            }
            self.enabled = false;
            info!("light control disabled");
        }
    }

    /// Best-effort lights-off for process exit.
    pub async fn shutdown(&mut self) {
        if self.enabled && self.should_send(LightCommand::Off) {
            self.send(LightCommand::Off).await;
        }
    }

    pub fn client(&self) -> Option<&GoveeClient> {
        self.client.as_ref()
    }

    fn should_send(&self, command: LightCommand) -> bool {
        self.last_sent != Some(command)
    }

    async fn send(&mut self, command: LightCommand) {
        let Some(client) = &self.client else {
            return;
        };
        match client.apply(command).await {
            Ok(()) => self.last_sent = Some(command),
            // Cache untouched: the next identical resolution retries.
            Err(e) => warn!("light dispatch failed, will retry next tick: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glowstatus_core::Rgb;
    use glowstatus_core::status::{StatusSource, WHITE};

    fn dispatcher() -> Dispatcher {
        // No device configured: send() is a no-op, which lets the dedup
        // bookkeeping be exercised directly.
        Dispatcher {
            client: None,
            enabled: true,
            last_sent: None,
        }
    }

    fn status(tag: &str, color: Rgb, power_off: bool) -> ResolvedStatus {
        ResolvedStatus {
            tag: tag.to_string(),
            source: StatusSource::Calendar,
            color: Some(color),
            power_off,
        }
    }

    #[test]
    fn test_identical_command_is_deduplicated() {
        let mut d = dispatcher();
        let red_on = status("meeting", Rgb::new(255, 0, 0), false).light_command();

        assert!(d.should_send(red_on));
        d.last_sent = Some(red_on);
        assert!(!d.should_send(red_on));

        // A different color for the same power state must go through.
        let blue_on = status("focus", Rgb::new(0, 0, 255), false).light_command();
        assert!(d.should_send(blue_on));
    }

    #[test]
    fn test_power_off_distinct_from_any_color() {
        let mut d = dispatcher();
        d.last_sent = Some(LightCommand::On { color: WHITE });
        assert!(d.should_send(LightCommand::Off));

        d.last_sent = Some(LightCommand::Off);
        assert!(!d.should_send(LightCommand::Off));
    }

    #[tokio::test]
    async fn test_failed_send_keeps_cache_for_retry() {
        // With no client the send is skipped entirely and nothing is
        // recorded, so the next tick dispatches again.
        let mut d = dispatcher();
        let command = status("meeting", Rgb::new(255, 0, 0), false);

        d.apply(&command).await;
        assert_eq!(d.last_sent, None);
        assert!(d.should_send(command.light_command()));
    }

    #[tokio::test]
    async fn test_disabled_dispatcher_ignores_status() {
        let mut d = dispatcher();
        d.set_enabled(false).await;

        d.apply(&status("meeting", Rgb::new(255, 0, 0), false)).await;
        assert_eq!(d.last_sent, None);
    }

    #[tokio::test]
    async fn test_reenable_forgets_cache() {
        let mut d = dispatcher();
        d.last_sent = Some(LightCommand::Off);
        d.set_enabled(false).await;

        // Re-enabling must re-dispatch even a previously-sent command, but
        // a deviceless dispatcher stays disabled.
        d.set_enabled(true).await;
        assert!(!d.is_enabled());
    }
}
