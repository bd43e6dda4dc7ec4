//! Shared state for the control API.

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};

use crate::engine::{EngineCommand, StatusReport};

/// Handle to the evaluator task. Route handlers never touch engine state
/// directly; they send a command and await its reply, which preserves the
/// single-writer discipline.
#[derive(Clone)]
pub struct AppState {
    tx: mpsc::Sender<EngineCommand>,
}

impl AppState {
    pub fn new(tx: mpsc::Sender<EngineCommand>) -> Self {
        AppState { tx }
    }

    pub async fn status(&self) -> Result<StatusReport> {
        self.request(|reply| EngineCommand::Status { reply }).await
    }

    pub async fn set_override(&self, tag: String) -> Result<StatusReport> {
        self.request(|reply| EngineCommand::SetOverride { tag, reply })
            .await
    }

    pub async fn clear_override(&self) -> Result<StatusReport> {
        self.request(|reply| EngineCommand::ClearOverride { reply })
            .await
    }

    pub async fn set_sync(&self, enabled: bool) -> Result<StatusReport> {
        self.request(|reply| EngineCommand::SetSync { enabled, reply })
            .await?
            .map_err(|e| anyhow::anyhow!(e))
    }

    pub async fn set_lights(&self, enabled: bool) -> Result<StatusReport> {
        self.request(|reply| EngineCommand::SetLights { enabled, reply })
            .await?
            .map_err(|e| anyhow::anyhow!(e))
    }

    pub async fn refresh_now(&self) -> Result<StatusReport> {
        self.request(|reply| EngineCommand::RefreshNow { reply })
            .await
    }

    pub async fn test_lights(&self) -> Result<()> {
        self.request(|reply| EngineCommand::TestLights { reply })
            .await?
            .map_err(|e| anyhow::anyhow!(e))
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| anyhow::anyhow!("Engine task is not running"))?;
        reply_rx
            .await
            .map_err(|_| anyhow::anyhow!("Engine task dropped the request"))
    }
}
