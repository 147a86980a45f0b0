//! Asset management API: categories, status sets and batch asset
//! creation for one project.

use async_trait::async_trait;
use takeoff_core::batch::MAX_BATCH_SIZE;
use takeoff_core::catalog::AssetCatalog;
use takeoff_core::error::CoreError;
use takeoff_core::records::{AssetPayload, CatalogCategory, CatalogStatus, NewCategory};

use crate::api::{ForgeApi, ForgeApiError, Results};

/// Client for the asset management service.
#[derive(Clone)]
pub struct AssetsApi {
    api: ForgeApi,
}

impl AssetsApi {
    pub fn new(api: ForgeApi) -> Self {
        Self { api }
    }

    pub async fn categories(&self, project_id: &str) -> Result<Vec<CatalogCategory>, ForgeApiError> {
        let page: Results<CatalogCategory> = self.api.get_json(&categories_path(project_id)).await?;
        Ok(page.results)
    }

    pub async fn create_category(
        &self,
        project_id: &str,
        category: &NewCategory,
    ) -> Result<CatalogCategory, ForgeApiError> {
        self.api.post_json(&categories_path(project_id), category).await
    }

    /// Asset statuses of the project, across all status sets.
    pub async fn statuses(&self, project_id: &str) -> Result<Vec<CatalogStatus>, ForgeApiError> {
        let page: Results<CatalogStatus> = self.api.get_json(&statuses_path(project_id)).await?;
        Ok(page.results)
    }

    /// Create a status set. The body is passed through unchanged.
    pub async fn create_status_set(
        &self,
        project_id: &str,
        status_set: &serde_json::Value,
    ) -> Result<serde_json::Value, ForgeApiError> {
        self.api.post_json(&statuses_path(project_id), status_set).await
    }

    /// Create up to [`MAX_BATCH_SIZE`] assets in one call.
    pub async fn batch_create(
        &self,
        project_id: &str,
        assets: &[AssetPayload],
    ) -> Result<(), ForgeApiError> {
        if assets.len() > MAX_BATCH_SIZE {
            return Err(ForgeApiError::InvalidRequest(format!(
                "Batch of {} assets exceeds the limit of {MAX_BATCH_SIZE}",
                assets.len()
            )));
        }
        let path = format!(
            "/bim360/assets/v2/projects/{}/assets:batch-create",
            urlencoding::encode(project_id)
        );
        self.api.post_unit(&path, assets).await
    }
}

fn categories_path(project_id: &str) -> String {
    format!(
        "/bim360/assets/v1/projects/{}/categories",
        urlencoding::encode(project_id)
    )
}

fn statuses_path(project_id: &str) -> String {
    format!(
        "/bim360/assets/v1/projects/{}/asset-statuses",
        urlencoding::encode(project_id)
    )
}

#[async_trait]
impl AssetCatalog for AssetsApi {
    async fn list_categories(&self, project_id: &str) -> Result<Vec<CatalogCategory>, CoreError> {
        Ok(self.categories(project_id).await?)
    }

    async fn list_statuses(&self, project_id: &str) -> Result<Vec<CatalogStatus>, CoreError> {
        Ok(self.statuses(project_id).await?)
    }

    async fn create_category(
        &self,
        project_id: &str,
        category: &NewCategory,
    ) -> Result<CatalogCategory, CoreError> {
        Ok(AssetsApi::create_category(self, project_id, category).await?)
    }

    async fn batch_create_assets(
        &self,
        project_id: &str,
        assets: &[AssetPayload],
    ) -> Result<(), CoreError> {
        Ok(self.batch_create(project_id, assets).await?)
    }
}
