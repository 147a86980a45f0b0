//! Seams to the remote services the domain logic talks to.
//!
//! Implemented against the cloud APIs in `takeoff-forge` and against the
//! takeoff server's proxy routes in `takeoff-client`. Every failure comes
//! back as [`CoreError::Transport`] so callers can treat the two alike.

use async_trait::async_trait;

use crate::budget::{BudgetImport, RemoteBudget};
use crate::error::CoreError;
use crate::job::ExtractionKind;
use crate::records::{AssetPayload, CatalogCategory, CatalogStatus, NewCategory};
use crate::types::JobId;

/// Asks the remote compute service to run an extraction.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    /// Submit `kind` against the model at `target` (a version storage
    /// reference) with the given parameter blob.
    async fn submit(
        &self,
        kind: ExtractionKind,
        target: &str,
        parameters: &serde_json::Value,
    ) -> Result<JobId, CoreError>;
}

/// The asset-management catalog of one project.
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    async fn list_categories(&self, project_id: &str) -> Result<Vec<CatalogCategory>, CoreError>;

    async fn list_statuses(&self, project_id: &str) -> Result<Vec<CatalogStatus>, CoreError>;

    async fn create_category(
        &self,
        project_id: &str,
        category: &NewCategory,
    ) -> Result<CatalogCategory, CoreError>;

    /// Create up to [`MAX_BATCH_SIZE`](crate::batch::MAX_BATCH_SIZE)
    /// assets in one call. All-or-nothing per call.
    async fn batch_create_assets(
        &self,
        project_id: &str,
        assets: &[AssetPayload],
    ) -> Result<(), CoreError>;
}

/// The cost/budget catalog of one cost container.
#[async_trait]
pub trait BudgetCatalog: Send + Sync {
    async fn list_budgets(&self, cost_container_id: &str) -> Result<Vec<RemoteBudget>, CoreError>;

    async fn import_budgets(
        &self,
        cost_container_id: &str,
        import: &BudgetImport,
    ) -> Result<(), CoreError>;
}
