//! Bus-to-WebSocket relay for job notifications.
//!
//! [`NotificationRelay`] subscribes to the [`NotificationBus`] and pushes
//! each event to every connected client.
//!
//! [`NotificationBus`]: takeoff_events::NotificationBus

use std::sync::Arc;

use takeoff_events::JobEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

pub struct NotificationRelay {
    ws_manager: Arc<WsManager>,
}

impl NotificationRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<JobEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.relay(event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Notification bus closed, relay shutting down");
                    break;
                }
            }
        }
    }

    async fn relay(&self, event: JobEvent) {
        let job_id = event.notification.job_id.clone();
        let status = event.status();
        let delivered = self
            .ws_manager
            .broadcast_notification(event.notification)
            .await;
        tracing::info!(job_id = %job_id, %status, delivered, "Job notification relayed");
    }
}
