use std::collections::HashMap;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use takeoff_core::job::{JobNotification, TopicMessage};
use tokio::sync::{mpsc, RwLock};

/// Outbound queue of one notification socket.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// A notification subscriber.
pub struct WsConnection {
    pub sender: WsSender,
    pub connected_at: DateTime<Utc>,
    /// Last time any frame (usually a pong) arrived from the client.
    pub last_seen: DateTime<Utc>,
}

/// Registry of the sockets that receive job notifications.
///
/// Shared as `Arc<WsManager>` between the upgrade handler, the
/// notification relay and the heartbeat.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a subscriber and return its outbound queue.
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (sender, rx) = mpsc::unbounded_channel();
        let now = Utc::now();
        self.connections.write().await.insert(
            conn_id,
            WsConnection {
                sender,
                connected_at: now,
                last_seen: now,
            },
        );
        rx
    }

    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Record that the client is alive.
    pub async fn touch(&self, conn_id: &str) {
        if let Some(conn) = self.connections.write().await.get_mut(conn_id) {
            conn.last_seen = Utc::now();
        }
    }

    /// Queue `message` on every socket. Returns how many queues took it.
    pub async fn broadcast(&self, message: Message) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Push a job notification under the `Workitem-Notification` topic.
    ///
    /// Every subscriber gets every notification and filters by the job it
    /// is waiting on.
    pub async fn broadcast_notification(&self, notification: JobNotification) -> usize {
        let job_id = notification.job_id.clone();
        let text = match serde_json::to_string(&TopicMessage::workitem(notification)) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Failed to serialize job notification");
                return 0;
            }
        };
        self.broadcast(Message::Text(text.into())).await
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Ping every live subscriber and drop the ones that have been silent
    /// for longer than `stale_after` or whose socket task is gone.
    ///
    /// Returns the ids that were dropped.
    pub async fn ping_and_evict(&self, stale_after: Duration) -> Vec<String> {
        let cutoff = chrono::Duration::from_std(stale_after)
            .ok()
            .and_then(|window| Utc::now().checked_sub_signed(window));
        let mut conns = self.connections.write().await;

        let mut evicted = Vec::new();
        for (conn_id, conn) in conns.iter() {
            if cutoff.is_some_and(|cutoff| conn.last_seen < cutoff) {
                let _ = conn.sender.send(Message::Close(None));
                evicted.push(conn_id.clone());
            } else if conn.sender.send(Message::Ping(Bytes::new())).is_err() {
                evicted.push(conn_id.clone());
            }
        }
        for conn_id in &evicted {
            conns.remove(conn_id);
        }
        evicted
    }

    /// Send Close to every subscriber and forget them all.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        tracing::info!(count = conns.len(), "Closed notification sockets");
        conns.clear();
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
