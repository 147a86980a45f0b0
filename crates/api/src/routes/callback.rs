//! Routes mounted at `/callback/designautomation`.
//!
//! Called by the design automation service; not meant for clients.

use axum::routing::{post, put};
use axum::Router;

use crate::handlers::callbacks;
use crate::state::AppState;

/// ```text
/// PUT    /results/{key}   -> receive_result
/// POST   /{key}           -> workitem_complete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/results/{key}", put(callbacks::receive_result))
        .route("/{key}", post(callbacks::workitem_complete))
}
