//! Row structs for the `price_book_items` and `price_book_settings` tables.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use takeoff_core::pricebook::PriceBookEntry;

/// A price_book_items row from the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PriceBookItemRow {
    pub id: i64,
    pub element_type: String,
    pub unit_price: f64,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PriceBookItemRow> for PriceBookEntry {
    fn from(row: PriceBookItemRow) -> Self {
        PriceBookEntry::new(row.element_type, row.unit_price, row.unit)
    }
}

/// The single price_book_settings row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PriceBookSettingsRow {
    pub budget_code_length: i32,
    pub updated_at: DateTime<Utc>,
}
