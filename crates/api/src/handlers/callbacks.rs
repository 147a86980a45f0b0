//! Callbacks invoked by running workitems.
//!
//! These are called by the design automation service, not by clients. A
//! workitem PUTs its `result.json` first and POSTs its completion after;
//! both carry the callback key chosen at submission.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use takeoff_core::job::JobStatus;
use takeoff_events::JobEvent;
use takeoff_forge::messages::WorkitemCallback;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// PUT /api/forge/callback/designautomation/results/{key}
///
/// Parks the uploaded result until the completion callback arrives.
pub async fn receive_result(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> AppResult<StatusCode> {
    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Result is not valid JSON: {e}")))?;

    tracing::debug!(callback_key = %key, bytes = body.len(), "Workitem result received");
    state.pending_results.insert(key, payload).await;
    Ok(StatusCode::OK)
}

/// POST /api/forge/callback/designautomation/{key}
///
/// Publishes a [`JobEvent`] for the workitem. A successful workitem
/// carries the result parked under the same key; other outcomes discard
/// it.
pub async fn workitem_complete(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(callback): Json<WorkitemCallback>,
) -> AppResult<StatusCode> {
    let workitem_status = callback.workitem_status();
    let status = workitem_status.job_status();
    let parked = state.pending_results.take(&key).await;

    let result = if status == JobStatus::Completed {
        if parked.is_none() {
            tracing::warn!(
                workitem_id = %callback.id,
                callback_key = %key,
                "Workitem succeeded without uploading a result",
            );
        }
        parked
    } else {
        tracing::warn!(
            workitem_id = %callback.id,
            workitem_status = ?workitem_status,
            report_url = callback.report_url.as_deref().unwrap_or(""),
            "Workitem did not succeed",
        );
        None
    };

    let notification = callback.into_notification(result);
    let delivered = state.notifications.publish(JobEvent::new(notification));
    tracing::info!(callback_key = %key, %status, delivered, "Workitem completion published");

    Ok(StatusCode::OK)
}
