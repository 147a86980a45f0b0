//! Proxies for the project asset catalog.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use takeoff_core::batch::{submit_in_chunks, MAX_BATCH_SIZE};
use takeoff_core::records::{AssetPayload, NewCategory};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of the batch-create proxy.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchCreateRequest {
    pub project_id: String,
    pub data: Vec<AssetPayload>,
}

/// GET /api/forge/bim360/projects/{project_id}/categories
pub async fn list_categories(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let categories = state.assets.categories(&project_id).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// POST /api/forge/bim360/projects/{project_id}/categories
pub async fn create_category(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(input): Json<NewCategory>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Category name must not be empty".into()));
    }
    let category = state.assets.create_category(&project_id, &input).await?;
    tracing::info!(project_id = %project_id, category_id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// GET /api/forge/bim360/projects/{project_id}/status-sets
pub async fn list_statuses(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let statuses = state.assets.statuses(&project_id).await?;
    Ok(Json(DataResponse { data: statuses }))
}

/// POST /api/forge/bim360/projects/{project_id}/status-sets
///
/// The body is passed to the asset service unchanged.
pub async fn create_status_set(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(input): Json<serde_json::Value>,
) -> AppResult<impl IntoResponse> {
    let created = state.assets.create_status_set(&project_id, &input).await?;
    tracing::info!(project_id = %project_id, "Status set created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// POST /api/forge/da4revit/bim360/assets
///
/// Sends the assets in chunks of at most [`MAX_BATCH_SIZE`]. Always
/// answers 200 with the [`BatchOutcome`](takeoff_core::batch::BatchOutcome);
/// callers check `failedChunkIndex` for partial success.
pub async fn batch_create_assets(
    State(state): State<AppState>,
    Json(input): Json<BatchCreateRequest>,
) -> AppResult<impl IntoResponse> {
    let total = input.data.len();
    let outcome = submit_in_chunks(&state.assets, &input.project_id, input.data, MAX_BATCH_SIZE).await;

    if outcome.is_complete() {
        tracing::info!(project_id = %input.project_id, total, calls = outcome.calls_issued, "Assets created");
    } else {
        tracing::warn!(
            project_id = %input.project_id,
            total,
            succeeded = outcome.succeeded_count,
            remaining = outcome.remaining.len(),
            "Asset batch-create stopped early",
        );
    }

    Ok(Json(DataResponse { data: outcome }))
}
