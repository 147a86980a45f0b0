//! Handlers for the price book.
//!
//! The book travels as a flat list: one `{Type, Price, Unit}` per element
//! type plus one `{budgetCodeLength}` settings item.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use takeoff_core::pricebook::PriceUpdate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPriceBookRequest {
    pub budget_code_length: u32,
}

/// POST /api/forge/pricebook/database
///
/// Replace the book with the seed entries and the given code length.
pub async fn reset_price_book(
    State(state): State<AppState>,
    Json(input): Json<ResetPriceBookRequest>,
) -> AppResult<impl IntoResponse> {
    let book = state.price_book.reset(input.budget_code_length).await?;
    tracing::info!(budget_code_length = input.budget_code_length, "Price book reset");
    Ok(Json(DataResponse {
        data: book.to_items(),
    }))
}

/// GET /api/forge/pricebook/items
pub async fn list_items(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let book = state.price_book.load().await?;
    Ok(Json(DataResponse {
        data: book.to_items(),
    }))
}

/// POST /api/forge/pricebook/items
///
/// Set one unit price. Returns the whole book after the change.
pub async fn upsert_price(
    State(state): State<AppState>,
    Json(input): Json<PriceUpdate>,
) -> AppResult<impl IntoResponse> {
    if input.element_type.trim().is_empty() {
        return Err(AppError::BadRequest("Element type must not be empty".into()));
    }
    if !input.unit_price.is_finite() || input.unit_price < 0.0 {
        return Err(AppError::BadRequest(format!(
            "Unit price must be a non-negative number, got {}",
            input.unit_price
        )));
    }

    state.price_book.upsert_price(&input).await?;
    tracing::info!(element = %input.element_type, unit_price = input.unit_price, "Unit price updated");

    let book = state.price_book.load().await?;
    Ok(Json(DataResponse {
        data: book.to_items(),
    }))
}
