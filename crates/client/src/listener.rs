//! WebSocket listener for job notifications.
//!
//! Connects to the server's notification endpoint, forwards every
//! `Workitem-Notification` to a channel, and reconnects with a fixed
//! delay when the connection drops. Notifications pushed while
//! disconnected are lost, so callers that submit work should wait for
//! the connected signal first (see [`NotificationListener::on_connected`]).

use std::time::Duration;

use futures::StreamExt;
use takeoff_core::job::{JobNotification, TopicMessage, NOTIFICATION_TOPIC};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// Delay before reconnecting after a failure.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Parse one text frame. Frames for other topics, or that are not
/// topic messages at all, yield `None`.
pub fn parse_notification(text: &str) -> Option<JobNotification> {
    match serde_json::from_str::<TopicMessage>(text) {
        Ok(message) if message.topic == NOTIFICATION_TOPIC => Some(message.data),
        Ok(message) => {
            tracing::trace!(topic = %message.topic, "Ignoring message for another topic");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, raw = %text, "Malformed notification frame");
            None
        }
    }
}

pub struct NotificationListener {
    ws_url: String,
    reconnect_delay: Duration,
    connected: Option<oneshot::Sender<()>>,
}

impl NotificationListener {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            reconnect_delay: RECONNECT_DELAY,
            connected: None,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Fire `signal` once the first handshake completes. The server
    /// registers a subscriber before answering the upgrade, so anything
    /// published after the signal is delivered.
    pub fn on_connected(mut self, signal: oneshot::Sender<()>) -> Self {
        self.connected = Some(signal);
        self
    }

    /// Run until `cancel` fires or the receiving side of `sender` is
    /// dropped.
    pub async fn run(mut self, sender: mpsc::UnboundedSender<JobNotification>, cancel: CancellationToken) {
        loop {
            tracing::info!(url = %self.ws_url, "Connecting to notification WebSocket");

            let connected = tokio::select! {
                () = cancel.cancelled() => break,
                result = connect_async(self.ws_url.as_str()) => result,
            };

            match connected {
                Ok((ws_stream, _response)) => {
                    tracing::info!("Notification WebSocket connected");
                    if let Some(signal) = self.connected.take() {
                        let _ = signal.send(());
                    }
                    let (_sink, mut stream) = ws_stream.split();
                    loop {
                        let frame = tokio::select! {
                            () = cancel.cancelled() => return,
                            frame = stream.next() => frame,
                        };
                        match frame {
                            Some(Ok(Message::Text(text))) => {
                                if let Some(notification) = parse_notification(&text) {
                                    tracing::debug!(
                                        job_id = %notification.job_id,
                                        status = %notification.status,
                                        "Notification received",
                                    );
                                    if sender.send(notification).is_err() {
                                        tracing::info!("Notification receiver dropped, listener stopping");
                                        return;
                                    }
                                }
                            }
                            Some(Ok(Message::Close(frame))) => {
                                tracing::info!(?frame, "Server closed notification WebSocket");
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::error!(error = %e, "Notification WebSocket receive error");
                                break;
                            }
                            None => {
                                tracing::info!("Notification WebSocket stream exhausted");
                                break;
                            }
                        }
                    }
                    tracing::warn!("Notification WebSocket session ended, reconnecting");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Notification WebSocket connection failed");
                }
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
        tracing::info!("Notification listener stopped");
    }
}
