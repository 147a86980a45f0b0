//! HTTP client for the takeoff server's `/api/forge` routes.
//!
//! Every successful response is unwrapped from the server's
//! `{ "data": ... }` envelope.

use async_trait::async_trait;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use takeoff_core::batch::BatchOutcome;
use takeoff_core::budget::{BudgetImport, RemoteBudget};
use takeoff_core::catalog::{AssetCatalog, BudgetCatalog, JobSubmitter};
use takeoff_core::error::CoreError;
use takeoff_core::job::ExtractionKind;
use takeoff_core::pricebook::{PriceBook, PriceBookItem, PriceBookStore, PriceUpdate};
use takeoff_core::records::{AssetPayload, CatalogCategory, CatalogStatus, NewCategory};
use takeoff_core::types::JobId;

use crate::config::ClientConfig;
use crate::error::ProxyError;

const API_PREFIX: &str = "/api/forge";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Workitem accepted by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedJob {
    pub work_item_id: String,
    pub work_item_status: String,
}

/// Result of creating a design automation activity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityCreation {
    pub activity: String,
    pub status: String,
}

/// Result of publishing an app bundle package.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppBundleCreation {
    pub app_bundle: String,
    pub version: u32,
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    parameters: &'a serde_json::Value,
}

#[derive(Serialize)]
struct BatchCreateBody<'a> {
    project_id: &'a str,
    data: &'a [AssetPayload],
}

#[derive(Serialize)]
struct ImportBudgetsBody<'a> {
    cost_container_id: &'a str,
    #[serde(flatten)]
    import: &'a BudgetImport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetBody {
    budget_code_length: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleBody<'a> {
    file_name: &'a str,
    engine: &'a str,
}

/// Client for one takeoff server.
#[derive(Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ProxyError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(http, &config.server_url))
    }

    pub fn with_client(http: reqwest::Client, server_url: &str) -> Self {
        Self {
            http,
            base_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- jobs ----

    /// Start an extraction of `kind` against the model at storage URN
    /// `target`.
    pub async fn submit_extraction(
        &self,
        kind: ExtractionKind,
        target: &str,
        parameters: &serde_json::Value,
    ) -> Result<SubmittedJob, ProxyError> {
        let extractor = match kind {
            ExtractionKind::Assets => "assets",
            ExtractionKind::QuantityTakeoff => "qto",
        };
        let path = format!("/da4revit/revit/{}/{extractor}", urlencoding::encode(target));
        self.request_data(Method::POST, &path, Some(&SubmitBody { parameters }))
            .await
    }

    // ---- asset catalog ----

    pub async fn categories(&self, project_id: &str) -> Result<Vec<CatalogCategory>, ProxyError> {
        self.request_data(Method::GET, &project_path(project_id, "categories"), None::<&()>)
            .await
    }

    pub async fn create_category(
        &self,
        project_id: &str,
        category: &NewCategory,
    ) -> Result<CatalogCategory, ProxyError> {
        self.request_data(Method::POST, &project_path(project_id, "categories"), Some(category))
            .await
    }

    pub async fn statuses(&self, project_id: &str) -> Result<Vec<CatalogStatus>, ProxyError> {
        self.request_data(Method::GET, &project_path(project_id, "status-sets"), None::<&()>)
            .await
    }

    pub async fn create_status_set(
        &self,
        project_id: &str,
        status_set: &serde_json::Value,
    ) -> Result<serde_json::Value, ProxyError> {
        self.request_data(Method::POST, &project_path(project_id, "status-sets"), Some(status_set))
            .await
    }

    /// The server chunks the batch itself and reports how far it got.
    pub async fn batch_create(
        &self,
        project_id: &str,
        assets: &[AssetPayload],
    ) -> Result<BatchOutcome, ProxyError> {
        let body = BatchCreateBody {
            project_id,
            data: assets,
        };
        self.request_data(Method::POST, "/da4revit/bim360/assets", Some(&body))
            .await
    }

    // ---- budgets ----

    pub async fn budgets(&self, cost_container_id: &str) -> Result<Vec<RemoteBudget>, ProxyError> {
        self.request_data(
            Method::GET,
            &project_path(cost_container_id, "budgets"),
            None::<&()>,
        )
        .await
    }

    pub async fn import(
        &self,
        cost_container_id: &str,
        import: &BudgetImport,
    ) -> Result<(), ProxyError> {
        let body = ImportBudgetsBody {
            cost_container_id,
            import,
        };
        self.request_unit(Method::POST, "/da4revit/bim360/budgets", Some(&body))
            .await
    }

    // ---- price book ----

    pub async fn price_book_items(&self) -> Result<Vec<PriceBookItem>, ProxyError> {
        self.request_data(Method::GET, "/pricebook/items", None::<&()>)
            .await
    }

    pub async fn set_price(&self, update: &PriceUpdate) -> Result<Vec<PriceBookItem>, ProxyError> {
        self.request_data(Method::POST, "/pricebook/items", Some(update))
            .await
    }

    pub async fn reset_price_book(
        &self,
        budget_code_length: u32,
    ) -> Result<Vec<PriceBookItem>, ProxyError> {
        self.request_data(
            Method::POST,
            "/pricebook/database",
            Some(&ResetBody { budget_code_length }),
        )
        .await
    }

    // ---- design automation management ----

    pub async fn engines(&self) -> Result<Vec<String>, ProxyError> {
        self.request_data(Method::GET, "/designautomation/engines", None::<&()>)
            .await
    }

    pub async fn activities(&self) -> Result<Vec<String>, ProxyError> {
        self.request_data(Method::GET, "/designautomation/activities", None::<&()>)
            .await
    }

    pub async fn create_activity(
        &self,
        file_name: &str,
        engine: &str,
    ) -> Result<ActivityCreation, ProxyError> {
        self.request_data(
            Method::POST,
            "/designautomation/activities",
            Some(&BundleBody { file_name, engine }),
        )
        .await
    }

    pub async fn delete_activity(&self, name: &str) -> Result<(), ProxyError> {
        let path = format!("/designautomation/activities/{}", urlencoding::encode(name));
        self.request_unit(Method::DELETE, &path, None::<&()>).await
    }

    /// `.zip` packages in the server's bundles folder.
    pub async fn app_bundle_packages(&self) -> Result<Vec<String>, ProxyError> {
        self.request_data(Method::GET, "/designautomation/appbundles", None::<&()>)
            .await
    }

    /// Publish the server-side `<file_name>.zip` as `<file_name>AppBundle`.
    pub async fn create_app_bundle(
        &self,
        file_name: &str,
        engine: &str,
    ) -> Result<AppBundleCreation, ProxyError> {
        self.request_data(
            Method::POST,
            "/designautomation/appbundles",
            Some(&BundleBody { file_name, engine }),
        )
        .await
    }

    pub async fn delete_app_bundle(&self, name: &str) -> Result<(), ProxyError> {
        let path = format!("/designautomation/appbundles/{}", urlencoding::encode(name));
        self.request_unit(Method::DELETE, &path, None::<&()>).await
    }

    // ---- private helpers ----

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ProxyError> {
        let url = format!("{}{API_PREFIX}{path}", self.base_url);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%method, path, status = status.as_u16(), "Server call");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProxyError::from_body(status.as_u16(), &body));
        }
        Ok(response)
    }

    async fn request_data<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ProxyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    async fn request_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ProxyError> {
        self.send(method, path, body).await?;
        Ok(())
    }
}

fn project_path(project_id: &str, resource: &str) -> String {
    format!("/bim360/projects/{}/{resource}", urlencoding::encode(project_id))
}

// ---------------------------------------------------------------------------
// Domain seams
// ---------------------------------------------------------------------------

#[async_trait]
impl JobSubmitter for ProxyClient {
    async fn submit(
        &self,
        kind: ExtractionKind,
        target: &str,
        parameters: &serde_json::Value,
    ) -> Result<JobId, CoreError> {
        let job = self.submit_extraction(kind, target, parameters).await?;
        tracing::info!(job_id = %job.work_item_id, status = %job.work_item_status, "Extraction submitted");
        Ok(JobId::new(job.work_item_id))
    }
}

#[async_trait]
impl AssetCatalog for ProxyClient {
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
        Ok(ProxyClient::create_category(self, project_id, category).await?)
    }

    async fn batch_create_assets(
        &self,
        project_id: &str,
        assets: &[AssetPayload],
    ) -> Result<(), CoreError> {
        let outcome = self.batch_create(project_id, assets).await?;
        if outcome.is_complete() {
            Ok(())
        } else {
            Err(CoreError::Transport(outcome.error.unwrap_or_else(|| {
                format!("Batch stopped after {} assets", outcome.succeeded_count)
            })))
        }
    }
}

#[async_trait]
impl BudgetCatalog for ProxyClient {
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

/// The server-hosted price book.
#[async_trait]
impl PriceBookStore for ProxyClient {
    async fn load(&self) -> Result<PriceBook, CoreError> {
        PriceBook::from_items(self.price_book_items().await?)
    }

    async fn upsert_price(&self, update: &PriceUpdate) -> Result<(), CoreError> {
        self.set_price(update).await?;
        Ok(())
    }

    async fn reset(&self, budget_code_length: u32) -> Result<PriceBook, CoreError> {
        PriceBook::from_items(self.reset_price_book(budget_code_length).await?)
    }
}
