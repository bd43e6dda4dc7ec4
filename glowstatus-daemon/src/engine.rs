//! The evaluator task.
//!
//! One task owns every piece of mutable state: the manual override, the
//! sync/lights switches, and the dispatcher with its dedup cache. Ticks and
//! control-surface commands are serialized through it, so no two
//! evaluations ever overlap and UI actions never race the polling loop.

use chrono::{DateTime, Utc};
use glowstatus_core::constants::NETWORK_FAILURE_WARN_THRESHOLD;
use glowstatus_core::resolver::FirstStartWins;
use glowstatus_core::{
    EventWindow, GlowConfig, ManualOverride, ResolvePolicy, ResolvedStatus, StatusRules, resolve,
};
use glowstatus_light_govee::{GoveeClient, TEST_CYCLE_COLORS, TEST_CYCLE_STEP};
use glowstatus_provider_google::{GoogleCalendarSource, Session};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::schedule::next_tick_delay;

/// Control-surface commands. Every variant replies so callers observe the
/// state the action produced, not the state before it.
pub enum EngineCommand {
    Status {
        reply: oneshot::Sender<StatusReport>,
    },
    SetOverride {
        tag: String,
        reply: oneshot::Sender<StatusReport>,
    },
    ClearOverride {
        reply: oneshot::Sender<StatusReport>,
    },
    SetSync {
        enabled: bool,
        reply: oneshot::Sender<Result<StatusReport, String>>,
    },
    SetLights {
        enabled: bool,
        reply: oneshot::Sender<Result<StatusReport, String>>,
    },
    RefreshNow {
        reply: oneshot::Sender<StatusReport>,
    },
    TestLights {
        reply: oneshot::Sender<Result<(), String>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Snapshot of engine state for the control API and CLI.
#[derive(Debug, Clone, Serialize)]
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

#[derive(Debug, Clone, Serialize)]
pub struct NextEvent {
    pub summary: String,
    pub start: DateTime<Utc>,
}

pub struct Engine {
    config: GlowConfig,
    rules: StatusRules,
    policy: ResolvePolicy,
    source: Option<GoogleCalendarSource>,
    dispatcher: Dispatcher,
    manual: Option<ManualOverride>,
    sync_enabled: bool,
    sync_degraded: bool,
    network_failures: u32,
    last_status: Option<ResolvedStatus>,
    last_window: EventWindow,
    last_evaluated: Option<DateTime<Utc>>,
}

impl Engine {
    pub fn new(config: GlowConfig) -> Self {
        let rules = config.status_rules();
        let policy = config.resolve_policy();

        let source = match (&config.calendar.account, &config.calendar.id) {
            (Some(account), Some(id)) if !account.is_empty() && !id.is_empty() => {
                match GoogleCalendarSource::new(account, id) {
                    Ok(source) => Some(source),
                    Err(e) => {
                        warn!("calendar source unavailable: {e}");
                        None
                    }
                }
            }
            _ => None,
        };

        let has_session = config
            .calendar
            .account
            .as_deref()
            .is_some_and(Session::exists);
        let sync_enabled = source.is_some() && config.calendar.can_enable_sync(has_session);
        if !sync_enabled {
            info!("calendar sync disabled (missing calendar, account, or session)");
        }

        let client = build_client(&config);
        let lights_enabled = config.govee.can_enable_lights();
        if client.is_none() {
            info!("light control disabled (device not configured)");
        }
        let dispatcher = Dispatcher::new(client, lights_enabled);

        Engine {
            config,
            rules,
            policy,
            source,
            dispatcher,
            manual: None,
            sync_enabled,
            sync_degraded: false,
            network_failures: 0,
            last_status: None,
            last_window: EventWindow::default(),
            last_evaluated: None,
        }
    }

    /// Run until shutdown. Ticks land on wall-clock boundaries; commands
    /// interrupt the wait and take effect immediately.
    pub async fn run(mut self, mut rx: mpsc::Receiver<EngineCommand>) {
        self.evaluate().await;

        loop {
            let delay = next_tick_delay(Utc::now(), self.config.effective_refresh_interval());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    self.evaluate().await;
                }
                cmd = rx.recv() => match cmd {
                    Some(EngineCommand::Shutdown { reply }) => {
                        self.dispatcher.shutdown().await;
                        info!("engine shut down, light turned off");
                        let _ = reply.send(());
                        return;
                    }
                    Some(cmd) => self.handle(cmd).await,
                    None => {
                        self.dispatcher.shutdown().await;
                        return;
                    }
                }
            }
        }
    }

    /// One full tick: fetch, resolve, dispatch.
    async fn evaluate(&mut self) {
        let now = Utc::now();

        let window = self.fetch_window(now).await;

        let resolution = resolve(
            now,
            &window,
            self.manual.as_ref(),
            &self.rules,
            &self.policy,
            &FirstStartWins,
        );

        if resolution.clear_override && self.manual.is_some() {
            info!("manual override cleared, calendar authority resumed");
            self.manual = None;
        }

        match &self.last_status {
            Some(previous) if previous.tag == resolution.status.tag => {}
            _ => info!(
                tag = %resolution.status.tag,
                source = ?resolution.status.source,
                "status changed"
            ),
        }

        self.dispatcher.apply(&resolution.status).await;

        self.last_status = Some(resolution.status);
        self.last_window = window;
        self.last_evaluated = Some(now);
    }

    /// Fetch the tick's event snapshot, degrading per the error taxonomy:
    /// auth failures disable sync for the session, transient failures leave
    /// this tick calendar-less and retry next time.
    async fn fetch_window(&mut self, now: DateTime<Utc>) -> EventWindow {
        if !self.sync_enabled || self.sync_degraded {
            return EventWindow::default();
        }
        let Some(source) = &self.source else {
            return EventWindow::default();
        };

        match source.fetch_window(now).await {
            Ok(window) => {
                self.network_failures = 0;
                window
            }
            Err(e) if e.is_auth() => {
                error!("calendar authentication failed, disabling sync until re-enabled: {e}");
                self.sync_degraded = true;
                EventWindow::default()
            }
            Err(e) => {
                self.network_failures += 1;
                if self.network_failures == NETWORK_FAILURE_WARN_THRESHOLD {
                    warn!(
                        failures = self.network_failures,
                        "calendar fetch keeps failing: {e}"
                    );
                } else {
                    info!("calendar fetch failed, will retry next tick: {e}");
                }
                EventWindow::default()
            }
        }
    }

    async fn handle(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Status { reply } => {
                let _ = reply.send(self.report());
            }
            EngineCommand::SetOverride { tag, reply } => {
                info!(%tag, "manual override set");
                self.manual = Some(ManualOverride::new(&tag, Utc::now()));
                self.evaluate().await;
                let _ = reply.send(self.report());
            }
            EngineCommand::ClearOverride { reply } => {
                if self.manual.take().is_some() {
                    info!("manual override cleared by user");
                }
                self.evaluate().await;
                let _ = reply.send(self.report());
            }
            EngineCommand::SetSync { enabled, reply } => {
                let _ = reply.send(self.set_sync(enabled).await);
            }
            EngineCommand::SetLights { enabled, reply } => {
                let _ = reply.send(self.set_lights(enabled).await);
            }
            EngineCommand::RefreshNow { reply } => {
                self.evaluate().await;
                let _ = reply.send(self.report());
            }
            EngineCommand::TestLights { reply } => {
                let _ = reply.send(self.start_light_test());
            }
            // Handled in run(); listed so the match stays exhaustive.
            EngineCommand::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn set_sync(&mut self, enabled: bool) -> Result<StatusReport, String> {
        if enabled {
            let has_session = self
                .config
                .calendar
                .account
                .as_deref()
                .is_some_and(Session::exists);
            if !self.config.calendar.can_enable_sync(has_session) || self.source.is_none() {
                return Err(
                    "Cannot enable sync: configure a calendar and account, then authenticate"
                        .to_string(),
                );
            }
            self.sync_enabled = true;
            // Re-enabling is the explicit recovery path from auth degradation.
            self.sync_degraded = false;
            self.network_failures = 0;
            info!("calendar sync enabled");
        } else {
            self.sync_enabled = false;
            info!("calendar sync disabled by user");
        }
        self.evaluate().await;
        Ok(self.report())
    }

    async fn set_lights(&mut self, enabled: bool) -> Result<StatusReport, String> {
        if enabled && !self.config.govee.can_enable_lights() {
            return Err(
                "Cannot enable lights: configure the Govee device id, model, and API key"
                    .to_string(),
            );
        }
        self.dispatcher.set_enabled(enabled).await;
        if enabled {
            // Immediately reflect the current status on the device.
            self.evaluate().await;
        }
        Ok(self.report())
    }

    /// Cycle a test palette on the device without blocking the evaluator.
    /// Only allowed while light control is off, so the cycle cannot fight
    /// the live dispatcher and leave its dedup cache lying about the
    /// device's real state.
    fn start_light_test(&self) -> Result<(), String> {
        if self.dispatcher.is_enabled() {
            return Err("Cannot test lights while light control is enabled; disable it first"
                .to_string());
        }
        let Some(client) = self.dispatcher.client() else {
            return Err("Cannot test lights: device not configured".to_string());
        };
        let client = client.clone();

        tokio::spawn(async move {
            info!("starting light test cycle");
            if let Err(e) = run_light_test(&client).await {
                warn!("light test cycle failed: {e}");
            } else {
                info!("light test cycle completed");
            }
        });

        Ok(())
    }

    fn report(&self) -> StatusReport {
        let next_event = self
            .last_evaluated
            .and_then(|at| self.last_window.next_after(at))
            .map(|e| NextEvent {
                summary: e.summary.clone(),
                start: e.start,
            });

        StatusReport {
            status: self.last_status.clone(),
            manual: self.manual.clone(),
            sync_enabled: self.sync_enabled,
            sync_degraded: self.sync_degraded,
            lights_enabled: self.dispatcher.is_enabled(),
            next_event,
            evaluated_at: self.last_evaluated,
        }
    }
}

fn build_client(config: &GlowConfig) -> Option<GoveeClient> {
    let api_key = config.govee.api_key()?;
    let device_id = config.govee.device_id.as_deref()?;
    let model = config.govee.device_model.as_deref()?;

    match GoveeClient::new(&api_key, device_id, model) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("govee client unavailable: {e}");
            None
        }
    }
}

async fn run_light_test(client: &GoveeClient) -> Result<(), glowstatus_core::DeviceError> {
    client.set_power(true).await?;
    for color in TEST_CYCLE_COLORS {
        client.set_color(color).await?;
        tokio::time::sleep(TEST_CYCLE_STEP).await;
    }
    client.set_power(false).await
}
