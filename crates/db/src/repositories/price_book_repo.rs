//! Repository for the `price_book_items` and `price_book_settings` tables.

use sqlx::PgPool;
use takeoff_core::pricebook::{PriceUpdate, SEED_ENTRIES};

use crate::models::price_book::{PriceBookItemRow, PriceBookSettingsRow};

/// Column list for price_book_items queries.
const COLUMNS: &str = "id, element_type, unit_price, unit, created_at, updated_at";

pub struct PriceBookRepo;

impl PriceBookRepo {
    /// All entries in insertion order.
    pub async fn list_items(pool: &PgPool) -> Result<Vec<PriceBookItemRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM price_book_items ORDER BY id");
        sqlx::query_as::<_, PriceBookItemRow>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_type(
        pool: &PgPool,
        element_type: &str,
    ) -> Result<Option<PriceBookItemRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM price_book_items WHERE element_type = $1");
        sqlx::query_as::<_, PriceBookItemRow>(&query)
            .bind(element_type)
            .fetch_optional(pool)
            .await
    }

    pub async fn get_settings(pool: &PgPool) -> Result<Option<PriceBookSettingsRow>, sqlx::Error> {
        sqlx::query_as::<_, PriceBookSettingsRow>(
            "SELECT budget_code_length, updated_at FROM price_book_settings WHERE id = 1",
        )
        .fetch_optional(pool)
        .await
    }

    /// Set the unit price of a type, inserting the type if absent.
    /// The unit of an existing row is left unchanged.
    pub async fn upsert_price(
        pool: &PgPool,
        update: &PriceUpdate,
    ) -> Result<PriceBookItemRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO price_book_items (element_type, unit_price, unit) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (element_type) DO UPDATE SET \
                unit_price = EXCLUDED.unit_price, \
                updated_at = now() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PriceBookItemRow>(&query)
            .bind(&update.element_type)
            .bind(update.unit_price)
            .bind(update.unit.clone().unwrap_or_default())
            .fetch_one(pool)
            .await
    }

    /// Empty both tables and write the seed entries plus one settings row,
    /// in a single transaction.
    pub async fn reset(pool: &PgPool, budget_code_length: i32) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM price_book_items")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM price_book_settings")
            .execute(&mut *tx)
            .await?;

        for (element_type, unit_price, unit) in SEED_ENTRIES {
            sqlx::query(
                "INSERT INTO price_book_items (element_type, unit_price, unit) VALUES ($1, $2, $3)",
            )
            .bind(element_type)
            .bind(unit_price)
            .bind(unit)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("INSERT INTO price_book_settings (id, budget_code_length) VALUES (1, $1)")
            .bind(budget_code_length)
            .execute(&mut *tx)
            .await?;

        tx.commit().await
    }
}
