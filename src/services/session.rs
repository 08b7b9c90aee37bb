// src/services/session.rs
//! Lifecycle scope for push work.
//!
//! A [`PushSession`] owns every background token fetch it starts plus a
//! single foreground task that runs token delivery one job at a time.
//! Dropping the session (or calling [`PushSession::shutdown`]) cancels
//! whatever is still outstanding.

use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing;

use crate::{
    errors::{PushError, PushResult},
    models::{FetchOutcome, ProviderKind, PushToken},
    services::delivery_service::TokenDelivery,
};

#[derive(Debug)]
pub enum ForegroundJob {
    DeliverToken { token: PushToken, provider: ProviderKind },
    Flush(oneshot::Sender<()>),
}

/// Cheap handle for queueing work on the session's foreground task.
#[derive(Debug, Clone)]
pub struct ForegroundHandle {
    tx: mpsc::UnboundedSender<ForegroundJob>,
}

impl ForegroundHandle {
    /// Queues a token for delivery. Empty tokens and `ProviderKind::None`
    /// never reach the backend.
    pub fn dispatch_token(&self, token: PushToken, provider: ProviderKind) -> PushResult<()> {
        if token.is_empty() {
            return Err(PushError::InvalidPayload("empty push token".to_string()));
        }
        if provider == ProviderKind::None {
            return Err(PushError::InvalidPayload(format!(
                "token {} has no provider to register with",
                token
            )));
        }

        self.tx
            .send(ForegroundJob::DeliverToken { token, provider })
            .map_err(|_| PushError::ChannelClosed)
    }

    /// Resolves once every job queued before it has run.
    pub async fn flush(&self) -> PushResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(ForegroundJob::Flush(ack_tx))
            .map_err(|_| PushError::ChannelClosed)?;
        ack_rx.await.map_err(|_| PushError::ChannelClosed)
    }
}

pub struct PushSession {
    tasks: JoinSet<FetchOutcome>,
    foreground: ForegroundHandle,
    foreground_task: JoinHandle<()>,
}

impl PushSession {
    /// Fails with `RuntimeUnavailable` when called outside a tokio runtime.
    pub fn new(delivery: Arc<dyn TokenDelivery>) -> PushResult<Self> {
        let handle = Handle::try_current().map_err(|_| PushError::RuntimeUnavailable)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let foreground_task = handle.spawn(run_foreground(rx, delivery));

        Ok(Self {
            tasks: JoinSet::new(),
            foreground: ForegroundHandle { tx },
            foreground_task,
        })
    }

    pub fn foreground(&self) -> ForegroundHandle {
        self.foreground.clone()
    }

    pub fn spawn_fetch<F>(&mut self, fetch: F)
    where
        F: Future<Output = FetchOutcome> + Send + 'static,
    {
        self.tasks.spawn(fetch);
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for all started fetches, then for the foreground queue to drain.
    pub async fn wait(&mut self) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if e.is_cancelled() => tracing::debug!("Token fetch cancelled"),
                Err(e) => tracing::error!("Token fetch task panicked: {}", e),
            }
        }

        if let Err(e) = self.foreground.flush().await {
            tracing::error!("Foreground queue unavailable: {}", e);
        }
        outcomes
    }

    pub async fn shutdown(&mut self) {
        self.tasks.shutdown().await;
        self.foreground_task.abort();
        tracing::debug!("Push session shut down");
    }
}

impl Drop for PushSession {
    fn drop(&mut self) {
        // JoinSet aborts its own tasks on drop.
        self.foreground_task.abort();
    }
}

async fn run_foreground(
    mut rx: mpsc::UnboundedReceiver<ForegroundJob>,
    delivery: Arc<dyn TokenDelivery>,
) {
    while let Some(job) = rx.recv().await {
        match job {
            ForegroundJob::DeliverToken { token, provider } => {
                send_token_to_server(delivery.as_ref(), &token, provider).await;
            }
            ForegroundJob::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

// Delivery failures end here.
async fn send_token_to_server(delivery: &dyn TokenDelivery, token: &PushToken, provider: ProviderKind) {
    if let Err(e) = delivery.deliver(token, provider).await {
        tracing::error!("Failed to send {} token to server: {}", provider, e);
    }
}
