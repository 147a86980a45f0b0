pub mod bim360;
pub mod callback;
pub mod da4revit;
pub mod design_automation;
pub mod health;
pub mod pricebook;

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/forge` route tree.
///
/// ```text
/// /ws                                                  WebSocket (job notifications)
///
/// /da4revit/revit/{version_storage}/assets             submit asset extraction (POST)
/// /da4revit/revit/{version_storage}/qto                submit quantity take-off (POST)
/// /da4revit/bim360/assets                              batch-create assets (POST)
/// /da4revit/bim360/budgets                             import budgets (POST)
///
/// /callback/designautomation/results/{key}             workitem result upload (PUT)
/// /callback/designautomation/{key}                     workitem completion (POST)
///
/// /bim360/projects/{project_id}/categories             list, create
/// /bim360/projects/{project_id}/status-sets            list, create
/// /bim360/projects/{cost_container_id}/budgets         list
///
/// /pricebook/database                                  reset (POST)
/// /pricebook/items                                     list, upsert price
///
/// /designautomation/engines                            list Revit engines
/// /designautomation/activities                         list, create
/// /designautomation/activities/{name}                  delete
/// /designautomation/appbundles                         list local packages, publish
/// /designautomation/appbundles/{name}                  delete
/// ```
///
/// Only the routes served from local state (callbacks, price book) sit
/// behind a `local_timeout` of 408. Routes calling the remote services
/// are bounded by the client's per-attempt timeout and retry budget
/// instead, and are never cancelled once a remote call may have landed.
pub fn api_routes(local_timeout: Duration) -> Router<AppState> {
    let local = Router::new()
        .nest("/callback/designautomation", callback::router())
        .nest("/pricebook", pricebook::router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            local_timeout,
        ));

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/da4revit", da4revit::router())
        .nest("/bim360", bim360::router())
        .nest("/designautomation", design_automation::router())
        .merge(local)
}
