use axum::routing::{get, post};
use axum::Router;

use crate::handlers::pricebook;
use crate::state::AppState;

/// Routes mounted at `/pricebook`.
///
/// ```text
/// POST   /database   -> reset_price_book
/// GET    /items      -> list_items
/// POST   /items      -> upsert_price
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/database", post(pricebook::reset_price_book))
        .route("/items", get(pricebook::list_items).post(pricebook::upsert_price))
}
