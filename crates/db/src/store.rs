//! [`PriceBookStore`] backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use takeoff_core::error::CoreError;
use takeoff_core::pricebook::{
    validate_budget_code_length, PriceBook, PriceBookStore, PriceUpdate,
};

use crate::repositories::PriceBookRepo;

#[derive(Clone)]
pub struct PgPriceBookStore {
    pool: PgPool,
}

impl PgPriceBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Price book query failed");
    CoreError::Transport(format!("Price book store: {err}"))
}

#[async_trait]
impl PriceBookStore for PgPriceBookStore {
    async fn load(&self) -> Result<PriceBook, CoreError> {
        let rows = PriceBookRepo::list_items(&self.pool)
            .await
            .map_err(store_error)?;
        let settings = PriceBookRepo::get_settings(&self.pool)
            .await
            .map_err(store_error)?;

        let budget_code_length = settings
            .map(|s| u32::try_from(s.budget_code_length))
            .transpose()
            .map_err(|_| CoreError::Internal("Stored budget code length is negative".into()))?;

        Ok(PriceBook::from_parts(
            rows.into_iter().map(Into::into).collect(),
            budget_code_length,
        ))
    }

    async fn upsert_price(&self, update: &PriceUpdate) -> Result<(), CoreError> {
        let row = PriceBookRepo::upsert_price(&self.pool, update)
            .await
            .map_err(store_error)?;
        tracing::debug!(element = %row.element_type, unit_price = row.unit_price, "Price upserted");
        Ok(())
    }

    async fn reset(&self, budget_code_length: u32) -> Result<PriceBook, CoreError> {
        validate_budget_code_length(budget_code_length)?;
        PriceBookRepo::reset(&self.pool, budget_code_length as i32)
            .await
            .map_err(store_error)?;
        tracing::info!(budget_code_length, "Price book reset");
        self.load().await
    }
}
