//! In-memory fakes of the remote seams, for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::budget::{BudgetImport, RemoteBudget};
use crate::catalog::{AssetCatalog, BudgetCatalog};
use crate::error::CoreError;
use crate::pricebook::{PriceBook, PriceBookStore, PriceUpdate};
use crate::records::{AssetPayload, CatalogCategory, CatalogStatus, NewCategory};

// ---------------------------------------------------------------------------
// Asset catalog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeAssetCatalog {
    categories: Vec<CatalogCategory>,
    statuses: Vec<CatalogStatus>,
    fail_statuses: bool,
    fail_category_create: bool,
    failing_batch: Option<usize>,
    created: Mutex<Vec<NewCategory>>,
    batches: Mutex<Vec<Vec<AssetPayload>>>,
}

impl FakeAssetCatalog {
    pub fn with_category(mut self, id: &str, name: &str) -> Self {
        self.categories.push(CatalogCategory {
            id: id.into(),
            name: name.into(),
            parent_id: None,
        });
        self
    }

    pub fn with_status(mut self, id: &str, label: &str) -> Self {
        self.statuses.push(CatalogStatus {
            id: id.into(),
            label: label.into(),
        });
        self
    }

    pub fn failing_statuses(mut self) -> Self {
        self.fail_statuses = true;
        self
    }

    pub fn failing_category_create(mut self) -> Self {
        self.fail_category_create = true;
        self
    }

    /// Fail the batch-create call with this zero-based index.
    pub fn failing_batch(mut self, index: usize) -> Self {
        self.failing_batch = Some(index);
        self
    }

    pub fn created_categories(&self) -> Vec<NewCategory> {
        self.created.lock().unwrap().clone()
    }

    /// Sizes of every batch-create call, including a failed one.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    /// Assets from successful batch-create calls, in order.
    pub fn submitted(&self) -> Vec<AssetPayload> {
        let batches = self.batches.lock().unwrap();
        batches
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != self.failing_batch)
            .flat_map(|(_, batch)| batch.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl AssetCatalog for FakeAssetCatalog {
    async fn list_categories(&self, _project_id: &str) -> Result<Vec<CatalogCategory>, CoreError> {
        Ok(self.categories.clone())
    }

    async fn list_statuses(&self, _project_id: &str) -> Result<Vec<CatalogStatus>, CoreError> {
        if self.fail_statuses {
            return Err(CoreError::Transport("status sets unavailable".into()));
        }
        Ok(self.statuses.clone())
    }

    async fn create_category(
        &self,
        _project_id: &str,
        category: &NewCategory,
    ) -> Result<CatalogCategory, CoreError> {
        if self.fail_category_create {
            return Err(CoreError::Transport("category create rejected".into()));
        }
        let mut created = self.created.lock().unwrap();
        created.push(category.clone());
        Ok(CatalogCategory {
            id: format!("new-{}", created.len()),
            name: category.name.clone(),
            parent_id: Some(category.parent_id.clone()),
        })
    }

    async fn batch_create_assets(
        &self,
        _project_id: &str,
        assets: &[AssetPayload],
    ) -> Result<(), CoreError> {
        let mut batches = self.batches.lock().unwrap();
        let index = batches.len();
        batches.push(assets.to_vec());
        if Some(index) == self.failing_batch {
            return Err(CoreError::Transport(format!("batch {index} rejected")));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Budget catalog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeBudgetCatalog {
    budgets: Vec<RemoteBudget>,
    fail_list: bool,
    imports: Mutex<Vec<BudgetImport>>,
}

impl FakeBudgetCatalog {
    pub fn with_budgets(mut self, budgets: Vec<RemoteBudget>) -> Self {
        self.budgets = budgets;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn imports(&self) -> Vec<BudgetImport> {
        self.imports.lock().unwrap().clone()
    }
}

#[async_trait]
impl BudgetCatalog for FakeBudgetCatalog {
    async fn list_budgets(&self, _cost_container_id: &str) -> Result<Vec<RemoteBudget>, CoreError> {
        if self.fail_list {
            return Err(CoreError::Transport("budgets unavailable".into()));
        }
        Ok(self.budgets.clone())
    }

    async fn import_budgets(
        &self,
        _cost_container_id: &str,
        import: &BudgetImport,
    ) -> Result<(), CoreError> {
        self.imports.lock().unwrap().push(import.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Price book store
// ---------------------------------------------------------------------------

/// Store whose upserts fail for a fixed set of element types.
pub struct FailingPriceBookStore {
    book: Mutex<PriceBook>,
    failing: Vec<String>,
}

impl FailingPriceBookStore {
    pub fn new(book: PriceBook, failing: &[&str]) -> Self {
        Self {
            book: Mutex::new(book),
            failing: failing.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl PriceBookStore for FailingPriceBookStore {
    async fn load(&self) -> Result<PriceBook, CoreError> {
        Ok(self.book.lock().unwrap().clone())
    }

    async fn upsert_price(&self, update: &PriceUpdate) -> Result<(), CoreError> {
        if self.failing.contains(&update.element_type) {
            return Err(CoreError::Transport(format!("upsert of {} failed", update.element_type)));
        }
        self.book.lock().unwrap().upsert_price(update);
        Ok(())
    }

    async fn reset(&self, budget_code_length: u32) -> Result<PriceBook, CoreError> {
        let seeded = PriceBook::seeded(budget_code_length);
        *self.book.lock().unwrap() = seeded.clone();
        Ok(seeded)
    }
}
