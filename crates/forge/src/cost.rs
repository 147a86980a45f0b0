//! Cost management API: budgets of one cost container.

use async_trait::async_trait;
use takeoff_core::budget::{BudgetImport, RemoteBudget};
use takeoff_core::catalog::BudgetCatalog;
use takeoff_core::error::CoreError;

use crate::api::{ForgeApi, ForgeApiError, Results};

#[derive(Clone)]
pub struct CostApi {
    api: ForgeApi,
}

impl CostApi {
    pub fn new(api: ForgeApi) -> Self {
        Self { api }
    }

    pub async fn budgets(&self, cost_container_id: &str) -> Result<Vec<RemoteBudget>, ForgeApiError> {
        let page: Results<RemoteBudget> = self
            .api
            .get_json(&format!("{}/budgets", container_path(cost_container_id)))
            .await?;
        Ok(page.results)
    }

    /// Import budget lines. With `append == false` the container's
    /// budgets are replaced.
    pub async fn import(
        &self,
        cost_container_id: &str,
        import: &BudgetImport,
    ) -> Result<(), ForgeApiError> {
        self.api
            .post_unit(&format!("{}/budgets:import", container_path(cost_container_id)), import)
            .await
    }
}

fn container_path(cost_container_id: &str) -> String {
    format!("/cost/v1/containers/{}", urlencoding::encode(cost_container_id))
}

#[async_trait]
impl BudgetCatalog for CostApi {
    async fn list_budgets(&self, cost_container_id: &str) -> Result<Vec<RemoteBudget>, CoreError> {
        Ok(self.budgets(cost_container_id).await?)
    }

    async fn import_budgets(
        &self,
        cost_container_id: &str,
        import: &BudgetImport,
    ) -> Result<(), CoreError> {
        Ok(self.import(cost_container_id, import).await?)
    }
}
