//! At-most-once delivery of position deltas to the risk overlay

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use super::{PositionDelta, RiskOverlay};

/// Non-blocking sender half. A lost delta only makes the overlay's view less accurate;
/// trading decisions never wait on delivery.
#[derive(Clone)]
pub struct RiskNotifier {
    tx: mpsc::UnboundedSender<PositionDelta>,
}

impl RiskNotifier {
    /// Spawns the forwarding task; it ends once every notifier clone is dropped.
    pub fn spawn(overlay: Arc<dyn RiskOverlay>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<PositionDelta>();
        let handle = tokio::spawn(async move {
            while let Some(delta) = rx.recv().await {
                overlay.update_position(&delta).await;
            }
            debug!("Risk notifier channel closed");
        });
        (Self { tx }, handle)
    }

    /// A notifier with no receiver; every delta is dropped.
    pub fn disconnected() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }

    pub fn notify(&self, delta: PositionDelta) {
        if let Err(e) = self.tx.send(delta) {
            debug!(token = %e.0.token, "Risk overlay notification dropped");
        }
    }
}
