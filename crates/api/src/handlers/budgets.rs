//! Proxies for the cost catalog's budgets.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use takeoff_core::budget::BudgetImport;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of the import proxy: `{ cost_container_id, data, append }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportBudgetsRequest {
    pub cost_container_id: String,
    #[serde(flatten)]
    pub import: BudgetImport,
}

/// GET /api/forge/bim360/projects/{cost_container_id}/budgets
pub async fn list_budgets(
    State(state): State<AppState>,
    Path(cost_container_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let budgets = state.cost.budgets(&cost_container_id).await?;
    Ok(Json(DataResponse { data: budgets }))
}

/// POST /api/forge/da4revit/bim360/budgets
pub async fn import_budgets(
    State(state): State<AppState>,
    Json(input): Json<ImportBudgetsRequest>,
) -> AppResult<StatusCode> {
    state
        .cost
        .import(&input.cost_container_id, &input.import)
        .await?;
    tracing::info!(
        cost_container_id = %input.cost_container_id,
        rows = input.import.data.len(),
        append = input.import.append,
        "Budgets imported",
    );
    Ok(StatusCode::NO_CONTENT)
}
