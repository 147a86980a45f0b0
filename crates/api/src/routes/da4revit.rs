//! Routes mounted at `/da4revit`.

use axum::routing::post;
use axum::Router;

use crate::handlers::{budgets, catalog, jobs};
use crate::state::AppState;

/// ```text
/// POST   /revit/{version_storage}/assets   -> submit_asset_extraction
/// POST   /revit/{version_storage}/qto      -> submit_quantity_takeoff
/// POST   /bim360/assets                    -> batch_create_assets
/// POST   /bim360/budgets                   -> import_budgets
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/revit/{version_storage}/assets",
            post(jobs::submit_asset_extraction),
        )
        .route(
            "/revit/{version_storage}/qto",
            post(jobs::submit_quantity_takeoff),
        )
        .route("/bim360/assets", post(catalog::batch_create_assets))
        .route("/bim360/budgets", post(budgets::import_budgets))
}
