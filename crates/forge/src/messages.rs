//! Design automation workitem payloads and their mapping to job
//! notifications.
//!
//! When a workitem finishes, the service POSTs
//! `{"id": "...", "status": "...", "reportUrl": "..."}` to the
//! `onComplete` URL given at submission. This module deserializes that
//! body and translates the service's status strings into [`JobStatus`].

use serde::{Deserialize, Serialize};
use takeoff_core::job::{JobNotification, JobStatus};
use takeoff_core::types::JobId;

/// Workitem status as reported by the design automation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkitemStatus {
    Pending,
    InProgress,
    Success,
    Cancelled,
    /// Any of the `failed*` family (`failedDownload`, `failedInstructions`,
    /// `failedLimitProcessingTime`, ...). The raw value is kept for logs.
    Failed(String),
    /// Anything else; treated as still running.
    Unknown(String),
}

impl WorkitemStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "inprogress" => Self::InProgress,
            "success" => Self::Success,
            "cancelled" => Self::Cancelled,
            s if s.starts_with("failed") => Self::Failed(s.to_string()),
            s => Self::Unknown(s.to_string()),
        }
    }

    pub fn job_status(&self) -> JobStatus {
        match self {
            Self::Pending => JobStatus::Queued,
            Self::InProgress | Self::Unknown(_) => JobStatus::Running,
            Self::Success => JobStatus::Completed,
            Self::Cancelled => JobStatus::Cancelled,
            Self::Failed(_) => JobStatus::Failed,
        }
    }
}

/// Response of `POST /workitems` and `GET /workitems/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkitemResponse {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
}

/// Body of the `onComplete` callback.
pub type WorkitemCallback = WorkitemResponse;

impl WorkitemResponse {
    pub fn workitem_status(&self) -> WorkitemStatus {
        WorkitemStatus::parse(&self.status)
    }

    /// Build the notification pushed to listeners, attaching the parsed
    /// result payload when there is one.
    pub fn into_notification(self, result: Option<serde_json::Value>) -> JobNotification {
        let status = self.workitem_status().job_status();
        let notification = JobNotification::new(JobId::new(self.id), status);
        match result {
            Some(result) => notification.with_extra_info(result),
            None => notification,
        }
    }
}

/// Parse a workitem callback body.
pub fn parse_callback(text: &str) -> Result<WorkitemCallback, serde_json::Error> {
    serde_json::from_str(text)
}
