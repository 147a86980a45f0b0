//! Handlers that submit extraction workitems.
//!
//! The server picks the callback key for each workitem so the result
//! upload and the completion callback can be joined later.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use takeoff_core::job::ExtractionKind;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Optional body of a submit request. Missing parameters fall back to the
/// defaults for the extraction kind.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitJobRequest {
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub work_item_id: String,
    pub work_item_status: String,
}

/// POST /api/forge/da4revit/revit/{version_storage}/assets
pub async fn submit_asset_extraction(
    State(state): State<AppState>,
    Path(version_storage): Path<String>,
    Json(input): Json<SubmitJobRequest>,
) -> AppResult<impl IntoResponse> {
    submit(&state, ExtractionKind::Assets, &version_storage, input).await
}

/// POST /api/forge/da4revit/revit/{version_storage}/qto
pub async fn submit_quantity_takeoff(
    State(state): State<AppState>,
    Path(version_storage): Path<String>,
    Json(input): Json<SubmitJobRequest>,
) -> AppResult<impl IntoResponse> {
    submit(&state, ExtractionKind::QuantityTakeoff, &version_storage, input).await
}

async fn submit(
    state: &AppState,
    kind: ExtractionKind,
    version_storage: &str,
    input: SubmitJobRequest,
) -> AppResult<impl IntoResponse> {
    let parameters = input
        .parameters
        .unwrap_or_else(|| kind.default_parameters());
    let callback_key = uuid::Uuid::new_v4().simple().to_string();

    let workitem = state
        .design_automation
        .submit_workitem(kind, version_storage, &parameters, &callback_key)
        .await?;

    tracing::info!(
        workitem_id = %workitem.id,
        ?kind,
        callback_key = %callback_key,
        "Extraction submitted",
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SubmitJobResponse {
                work_item_id: workitem.id,
                work_item_status: workitem.status,
            },
        }),
    ))
}
