use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::design_automation;
use crate::state::AppState;

/// Routes mounted at `/designautomation`.
///
/// ```text
/// GET    /engines               -> list_engines
/// GET    /activities            -> list_activities
/// POST   /activities            -> create_activity
/// DELETE /activities/{name}     -> delete_activity
/// GET    /appbundles            -> list_app_bundles
/// POST   /appbundles            -> create_app_bundle
/// DELETE /appbundles/{name}     -> delete_app_bundle
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/engines", get(design_automation::list_engines))
        .route(
            "/activities",
            get(design_automation::list_activities).post(design_automation::create_activity),
        )
        .route(
            "/activities/{name}",
            delete(design_automation::delete_activity),
        )
        .route(
            "/appbundles",
            get(design_automation::list_app_bundles).post(design_automation::create_app_bundle),
        )
        .route(
            "/appbundles/{name}",
            delete(design_automation::delete_app_bundle),
        )
}
