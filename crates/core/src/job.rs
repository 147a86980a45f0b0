//! Remote job status and the notification events pushed for it.
//!
//! A job is a design-automation workitem running a headless Revit
//! extraction. The remote service reports progress asynchronously; the
//! server relays each report to clients as a [`JobNotification`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::JobId;

/// Topic name under which notifications are pushed to clients.
pub const NOTIFICATION_TOPIC: &str = "Workitem-Notification";

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a remote job.
///
/// `Completed`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether no further events are expected for the job.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive parse; clients historically lowercase the status.
impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::Validation(format!("Unknown job status '{other}'"))),
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        value.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// JobNotification
// ---------------------------------------------------------------------------

/// A status event for a previously submitted job.
///
/// Wire shape: `{ "WorkitemId": "...", "Status": "...", "ExtraInfo": {...} }`.
/// `ExtraInfo` is only present on `Completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobNotification {
    #[serde(rename = "WorkitemId")]
    pub job_id: JobId,
    #[serde(rename = "Status")]
    pub status: JobStatus,
    #[serde(rename = "ExtraInfo", default, skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<serde_json::Value>,
}

impl JobNotification {
    pub fn new(job_id: JobId, status: JobStatus) -> Self {
        Self {
            job_id,
            status,
            extra_info: None,
        }
    }

    pub fn with_extra_info(mut self, extra_info: serde_json::Value) -> Self {
        self.extra_info = Some(extra_info);
        self
    }
}

/// Envelope used when a notification is pushed over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicMessage {
    pub topic: String,
    pub data: JobNotification,
}

impl TopicMessage {
    pub fn workitem(data: JobNotification) -> Self {
        Self {
            topic: NOTIFICATION_TOPIC.to_string(),
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction parameters
// ---------------------------------------------------------------------------

/// Which extractor a job targets. Each maps to its own activity and
/// parameter blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionKind {
    /// Asset records (duct terminals) for the asset catalog.
    Assets,
    /// Quantity take-off counts for budgeting.
    QuantityTakeoff,
}

impl ExtractionKind {
    /// Default parameter blob sent as `params.json` to the extractor.
    pub fn default_parameters(self) -> serde_json::Value {
        match self {
            Self::Assets => serde_json::json!({ "DuctTerminal": true }),
            Self::QuantityTakeoff => serde_json::json!({
                "walls": true,
                "Concrete": true,
                "floors": true,
                "doors": true,
                "windows": true,
            }),
        }
    }
}
