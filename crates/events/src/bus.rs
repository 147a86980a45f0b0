//! Notification bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`NotificationBus`] is shared via `Arc<NotificationBus>` across the
//! server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use takeoff_core::job::{JobNotification, JobStatus};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// JobEvent
// ---------------------------------------------------------------------------

/// A job notification stamped with the time the server received it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    pub notification: JobNotification,
    pub received_at: DateTime<Utc>,
}

impl JobEvent {
    pub fn new(notification: JobNotification) -> Self {
        Self {
            notification,
            received_at: Utc::now(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.notification.status
    }
}

// ---------------------------------------------------------------------------
// NotificationBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for [`JobEvent`]s.
///
/// ```rust
/// use takeoff_core::job::{JobNotification, JobStatus};
/// use takeoff_events::{JobEvent, NotificationBus};
///
/// let bus = NotificationBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(JobEvent::new(JobNotification::new("wi-1".into(), JobStatus::Running)));
/// ```
pub struct NotificationBus {
    sender: broadcast::Sender<JobEvent>,
}

impl NotificationBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Returns how many received it.
    ///
    /// With no subscribers the event is dropped; clients that are not
    /// connected when a job finishes never hear about it.
    pub fn publish(&self, event: JobEvent) -> usize {
        let job_id = event.notification.job_id.clone();
        let status = event.status();
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(job_id = %job_id, %status, receivers, "Job event published");
                receivers
            }
            Err(_) => {
                tracing::debug!(job_id = %job_id, %status, "Job event dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
