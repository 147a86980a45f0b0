//! Design automation management: engines, activities, app bundles.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use takeoff_forge::design_automation::ActivityState;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of both create routes: a bundle name (`<fileName>.zip` locally,
/// `<fileName>AppBundle` and `<fileName>Activity` remotely) and an engine.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleRequest {
    pub file_name: String,
    pub engine: String,
}

impl BundleRequest {
    fn validate(&self) -> AppResult<()> {
        if self.file_name.trim().is_empty() || self.engine.trim().is_empty() {
            return Err(AppError::BadRequest("fileName and engine are required".into()));
        }
        Ok(())
    }
}

/// GET /api/forge/designautomation/engines
pub async fn list_engines(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let engines = state.design_automation.revit_engines().await?;
    Ok(Json(DataResponse { data: engines }))
}

/// GET /api/forge/designautomation/activities
pub async fn list_activities(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let activities = state.design_automation.defined_activities().await?;
    Ok(Json(DataResponse { data: activities }))
}

/// POST /api/forge/designautomation/activities
///
/// 201 when the activity was created, 200 when it already existed.
pub async fn create_activity(
    State(state): State<AppState>,
    Json(input): Json<BundleRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let creation = state
        .design_automation
        .create_activity(&input.file_name, &input.engine)
        .await?;

    let status = match creation.status {
        ActivityState::Created => StatusCode::CREATED,
        ActivityState::Existing => StatusCode::OK,
    };
    Ok((status, Json(DataResponse { data: creation })))
}

/// GET /api/forge/designautomation/appbundles
///
/// Bundle packages available locally for publishing.
pub async fn list_app_bundles(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let packages = state.design_automation.local_app_bundles().await?;
    Ok(Json(DataResponse { data: packages }))
}

/// POST /api/forge/designautomation/appbundles
pub async fn create_app_bundle(
    State(state): State<AppState>,
    Json(input): Json<BundleRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let creation = state
        .design_automation
        .create_app_bundle(&input.file_name, &input.engine)
        .await?;
    Ok(Json(DataResponse { data: creation }))
}

/// DELETE /api/forge/designautomation/appbundles/{name}
pub async fn delete_app_bundle(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    state.design_automation.delete_app_bundle(&name).await?;
    tracing::info!(app_bundle = %name, "App bundle deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/forge/designautomation/activities/{name}
pub async fn delete_activity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    state.design_automation.delete_activity(&name).await?;
    tracing::info!(activity = %name, "Activity deleted");
    Ok(StatusCode::NO_CONTENT)
}
