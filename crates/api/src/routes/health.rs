use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the price book store answered.
    pub price_book_healthy: bool,
    pub ws_connections: usize,
}

/// GET /health -- returns service and price book health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let price_book_healthy = state.price_book.load().await.is_ok();
    let status = if price_book_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        price_book_healthy,
        ws_connections: state.ws_manager.connection_count().await,
    })
}

/// Mount health check routes (root level, not under `/api/forge`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
