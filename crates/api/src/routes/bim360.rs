//! Routes mounted at `/bim360`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{budgets, catalog};
use crate::state::AppState;

/// The budgets route takes a cost container id in the `{project_id}`
/// segment; path parameters sharing a position must share a name.
///
/// ```text
/// GET    /projects/{project_id}/categories    -> list_categories
/// POST   /projects/{project_id}/categories    -> create_category
/// GET    /projects/{project_id}/status-sets   -> list_statuses
/// POST   /projects/{project_id}/status-sets   -> create_status_set
/// GET    /projects/{project_id}/budgets       -> list_budgets
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/projects/{project_id}/status-sets",
            get(catalog::list_statuses).post(catalog::create_status_set),
        )
        .route("/projects/{project_id}/budgets", get(budgets::list_budgets))
}
