//! Budget engine: joins extracted element counts with the price book and
//! syncs the result with the remote cost catalog.

use serde::{Deserialize, Serialize};

use crate::catalog::BudgetCatalog;
use crate::error::CoreError;
use crate::pricebook::{PriceBook, PriceBookStore, PriceUpdate, MAX_BUDGET_CODE_LENGTH};
use crate::types::{deserialize_catalog_id, CatalogId};

/// Key of the quantity take-off result that names the workitem rather
/// than an element type.
pub const RESERVED_WORKITEM_KEY: &str = "workitem";

// ---------------------------------------------------------------------------
// Element counts
// ---------------------------------------------------------------------------

/// Counts produced by the quantity take-off extractor, in result order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementCounts {
    pub entries: Vec<(String, f64)>,
    pub workitem: Option<String>,
}

impl ElementCounts {
    /// Read `{ "Concrete": 12.5, "Window": 4, ..., "workitem": "..." }`.
    ///
    /// Non-numeric values other than the workitem key are skipped.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, CoreError> {
        let object = value
            .as_object()
            .ok_or_else(|| CoreError::Validation("Quantity result is not a JSON object".into()))?;

        let mut counts = Self::default();
        for (key, value) in object {
            if key == RESERVED_WORKITEM_KEY {
                counts.workitem = value.as_str().map(str::to_string);
                continue;
            }
            match value.as_f64() {
                Some(count) => counts.entries.push((key.clone(), count)),
                None => tracing::debug!(element = %key, "Skipping non-numeric count"),
            }
        }
        Ok(counts)
    }
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

/// Deterministic budget codes: a sequence number zero-padded to a fixed
/// width, starting at 1.
///
/// Codes are unique within one generator.
#[derive(Debug, Clone)]
pub struct BudgetCodeGenerator {
    length: u32,
    next: u64,
}

impl BudgetCodeGenerator {
    pub fn new(length: u32) -> Result<Self, CoreError> {
        if length == 0 {
            return Err(CoreError::MissingConfiguration(
                "Budget code length is zero; reset the price book with a non-zero length".into(),
            ));
        }
        if length > MAX_BUDGET_CODE_LENGTH {
            return Err(CoreError::Validation(format!(
                "Budget code length {length} exceeds the maximum of {MAX_BUDGET_CODE_LENGTH}"
            )));
        }
        Ok(Self { length, next: 1 })
    }

    pub fn next_code(&mut self) -> Result<String, CoreError> {
        let capacity = 10u64.pow(self.length);
        if self.next >= capacity {
            return Err(CoreError::Validation(format!(
                "Budget code length {} cannot hold more than {} rows",
                self.length,
                capacity - 1
            )));
        }
        let code = format!("{:0width$}", self.next, width = self.length as usize);
        self.next += 1;
        Ok(code)
    }
}

// ---------------------------------------------------------------------------
// Budget rows
// ---------------------------------------------------------------------------

/// One line of the computed budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRow {
    pub code: String,
    /// Element type label.
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
    pub amount: f64,
}

impl BudgetRow {
    fn reprice(&mut self, unit_price: f64) {
        self.unit_price = unit_price;
        self.amount = self.quantity * unit_price;
    }
}

/// Price each counted element type.
///
/// Types missing from the price book are skipped. Fails without producing
/// rows when the budget code length is unset or zero.
pub fn compute_budget(counts: &ElementCounts, book: &PriceBook) -> Result<Vec<BudgetRow>, CoreError> {
    let length = book.budget_code_length().ok_or_else(|| {
        CoreError::MissingConfiguration("Price book has no budget code length".into())
    })?;
    let mut codes = BudgetCodeGenerator::new(length)?;

    let mut rows = Vec::with_capacity(counts.entries.len());
    for (element_type, quantity) in &counts.entries {
        if element_type == RESERVED_WORKITEM_KEY {
            continue;
        }
        let Some(entry) = book.find(element_type) else {
            tracing::warn!(element = %element_type, "No price book entry, skipping");
            continue;
        };
        rows.push(BudgetRow {
            code: codes.next_code()?,
            name: element_type.clone(),
            quantity: *quantity,
            unit: entry.unit.clone(),
            unit_price: entry.unit_price,
            amount: quantity * entry.unit_price,
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Remote sync
// ---------------------------------------------------------------------------

/// Body of the budget import call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetImport {
    pub data: Vec<BudgetRow>,
    pub append: bool,
}

/// A budget line as returned by the cost catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBudget {
    #[serde(deserialize_with = "deserialize_catalog_id")]
    pub id: CatalogId,
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub unit: String,
}

/// Replace the remote budget with `rows` in a single import call.
pub async fn push_to_remote_budget<C>(
    catalog: &C,
    cost_container_id: &str,
    rows: &[BudgetRow],
) -> Result<(), CoreError>
where
    C: BudgetCatalog + ?Sized,
{
    let import = BudgetImport {
        data: rows.to_vec(),
        append: false,
    };
    catalog.import_budgets(cost_container_id, &import).await?;
    tracing::info!(cost_container_id, rows = rows.len(), "Budget pushed to cost catalog");
    Ok(())
}

/// What a pull changed locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullOutcome {
    /// Element types whose price-book price was updated.
    pub updated: Vec<String>,
    /// Element types whose upsert failed and were left as they were.
    pub failed_types: Vec<String>,
    /// Number of table rows repriced.
    pub rows_updated: usize,
}

/// Copy remote unit prices into the price book and reprice matching rows.
///
/// Upserts run concurrently; a failed one is logged and skipped without
/// affecting the others. Only the remote fetch itself can fail the call.
pub async fn pull_from_remote_budget<C, S>(
    catalog: &C,
    store: &S,
    cost_container_id: &str,
    rows: &mut [BudgetRow],
) -> Result<PullOutcome, CoreError>
where
    C: BudgetCatalog + ?Sized,
    S: PriceBookStore + ?Sized,
{
    let budgets = catalog.list_budgets(cost_container_id).await?;

    let upserts = budgets.iter().map(|budget| async move {
        let update = PriceUpdate {
            element_type: budget.name.clone(),
            unit_price: budget.unit_price,
            unit: (!budget.unit.is_empty()).then(|| budget.unit.clone()),
        };
        (budget, store.upsert_price(&update).await)
    });

    let mut outcome = PullOutcome::default();
    for (budget, result) in futures::future::join_all(upserts).await {
        match result {
            Ok(()) => {
                for row in rows.iter_mut().filter(|r| r.name == budget.name) {
                    row.reprice(budget.unit_price);
                    outcome.rows_updated += 1;
                }
                outcome.updated.push(budget.name.clone());
            }
            Err(e) => {
                tracing::warn!(element = %budget.name, error = %e, "Price upsert failed, skipping");
                outcome.failed_types.push(budget.name.clone());
            }
        }
    }

    tracing::info!(
        cost_container_id,
        updated = outcome.updated.len(),
        failed = outcome.failed_types.len(),
        rows = outcome.rows_updated,
        "Budget pulled from cost catalog",
    );
    Ok(outcome)
}
