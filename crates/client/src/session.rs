//! Extraction sessions: one submission, its notification, and the table
//! it produces.
//!
//! A session is owned by the caller and fed notifications from a
//! [`NotificationListener`](crate::NotificationListener). Each wraps a
//! [`ResultCorrelator`], so only the job it submitted can change its
//! table, and only once.

use takeoff_core::budget::{
    compute_budget, pull_from_remote_budget, push_to_remote_budget, BudgetRow, ElementCounts,
    PullOutcome,
};
use takeoff_core::catalog::{AssetCatalog, BudgetCatalog, JobSubmitter};
use takeoff_core::correlator::{Correlation, CorrelatorError, ResultCorrelator, SettledCallback};
use takeoff_core::error::CoreError;
use takeoff_core::job::{ExtractionKind, JobNotification};
use takeoff_core::pricebook::PriceBookStore;
use takeoff_core::reconcile::{CatalogReconciler, ReconcileOutcome, ReconcilePolicy};
use takeoff_core::records::{AssetCollection, ExtractedRecord};
use takeoff_core::types::JobId;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Correlator(#[from] CorrelatorError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Submit `kind` and start tracking the job.
///
/// With `supersede == false` an outstanding job is an error and nothing
/// is submitted.
async fn submit_tracked<S>(
    correlator: &mut ResultCorrelator,
    submitter: &S,
    kind: ExtractionKind,
    target: &str,
    supersede: bool,
    on_settled: SettledCallback,
) -> Result<JobId, SessionError>
where
    S: JobSubmitter + ?Sized,
{
    if !supersede {
        if let Some(current) = correlator.current() {
            return Err(CorrelatorError::JobOutstanding(current.clone()).into());
        }
    }

    let job_id = submitter
        .submit(kind, target, &kind.default_parameters())
        .await?;

    if supersede {
        correlator.supersede(job_id.clone(), on_settled);
    } else {
        correlator.begin_tracking(job_id.clone(), on_settled)?;
    }
    Ok(job_id)
}

// ---------------------------------------------------------------------------
// AssetSession
// ---------------------------------------------------------------------------

/// Asset extraction: submit, receive the asset table, upload it to the
/// project's asset catalog.
#[derive(Default)]
pub struct AssetSession {
    correlator: ResultCorrelator,
    records: Vec<ExtractedRecord>,
    policy: ReconcilePolicy,
}

impl AssetSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Submit an asset extraction for the model at `target`.
    pub async fn extract<S>(
        &mut self,
        submitter: &S,
        target: &str,
        on_settled: SettledCallback,
    ) -> Result<JobId, SessionError>
    where
        S: JobSubmitter + ?Sized,
    {
        submit_tracked(
            &mut self.correlator,
            submitter,
            ExtractionKind::Assets,
            target,
            false,
            on_settled,
        )
        .await
    }

    /// Like [`extract`](Self::extract), abandoning any outstanding job.
    pub async fn resubmit<S>(
        &mut self,
        submitter: &S,
        target: &str,
        on_settled: SettledCallback,
    ) -> Result<JobId, SessionError>
    where
        S: JobSubmitter + ?Sized,
    {
        submit_tracked(
            &mut self.correlator,
            submitter,
            ExtractionKind::Assets,
            target,
            true,
            on_settled,
        )
        .await
    }

    /// Feed a notification. A completion for the tracked job replaces the
    /// table with the extracted assets.
    pub fn handle(&mut self, event: &JobNotification) -> Correlation {
        let records = &mut self.records;
        self.correlator.on_event(event, |payload| {
            match AssetCollection::from_value(payload) {
                Ok(collection) => {
                    *records = collection.into_records();
                    tracing::info!(job_id = %event.job_id, assets = records.len(), "Asset table loaded");
                }
                Err(e) => {
                    records.clear();
                    tracing::error!(job_id = %event.job_id, error = %e, "Could not read asset result");
                }
            }
        })
    }

    pub fn is_waiting(&self) -> bool {
        self.correlator.is_tracking()
    }

    pub fn current_job(&self) -> Option<&JobId> {
        self.correlator.current()
    }

    pub fn records(&self) -> &[ExtractedRecord] {
        &self.records
    }

    /// Resolve the table against `project_id`'s catalog and create the
    /// assets there.
    pub async fn upload<C>(&self, catalog: &C, project_id: &str) -> ReconcileOutcome
    where
        C: AssetCatalog + ?Sized,
    {
        CatalogReconciler::new(catalog)
            .with_policy(self.policy)
            .reconcile(project_id, &self.records)
            .await
    }
}

// ---------------------------------------------------------------------------
// QtoSession
// ---------------------------------------------------------------------------

/// Quantity take-off: submit, receive element counts, price them into a
/// budget, and sync the budget with the cost catalog.
#[derive(Default)]
pub struct QtoSession {
    correlator: ResultCorrelator,
    counts: Option<ElementCounts>,
    rows: Vec<BudgetRow>,
}

impl QtoSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn extract<S>(
        &mut self,
        submitter: &S,
        target: &str,
        on_settled: SettledCallback,
    ) -> Result<JobId, SessionError>
    where
        S: JobSubmitter + ?Sized,
    {
        submit_tracked(
            &mut self.correlator,
            submitter,
            ExtractionKind::QuantityTakeoff,
            target,
            false,
            on_settled,
        )
        .await
    }

    pub async fn resubmit<S>(
        &mut self,
        submitter: &S,
        target: &str,
        on_settled: SettledCallback,
    ) -> Result<JobId, SessionError>
    where
        S: JobSubmitter + ?Sized,
    {
        submit_tracked(
            &mut self.correlator,
            submitter,
            ExtractionKind::QuantityTakeoff,
            target,
            true,
            on_settled,
        )
        .await
    }

    /// Feed a notification. A completion for the tracked job stores the
    /// counts; call [`build_budget`](Self::build_budget) to price them.
    pub fn handle(&mut self, event: &JobNotification) -> Correlation {
        let counts = &mut self.counts;
        self.correlator.on_event(event, |payload| {
            match ElementCounts::from_value(payload) {
                Ok(parsed) => {
                    tracing::info!(job_id = %event.job_id, kinds = parsed.entries.len(), "Quantities received");
                    *counts = Some(parsed);
                }
                Err(e) => {
                    *counts = None;
                    tracing::error!(job_id = %event.job_id, error = %e, "Could not read quantity result");
                }
            }
        })
    }

    /// [`handle`](Self::handle), then price the counts on completion.
    pub async fn handle_and_price<P>(
        &mut self,
        event: &JobNotification,
        price_book: &P,
    ) -> Result<Correlation, CoreError>
    where
        P: PriceBookStore + ?Sized,
    {
        let correlation = self.handle(event);
        if correlation == Correlation::Completed && self.counts.is_some() {
            self.build_budget(price_book).await?;
        }
        Ok(correlation)
    }

    /// Price the received counts with the current price book.
    ///
    /// On error the previous rows are cleared; no partial budget is kept.
    pub async fn build_budget<P>(&mut self, price_book: &P) -> Result<&[BudgetRow], CoreError>
    where
        P: PriceBookStore + ?Sized,
    {
        self.rows.clear();
        let counts = self
            .counts
            .as_ref()
            .ok_or_else(|| CoreError::Validation("No quantities received yet".into()))?;
        let book = price_book.load().await?;
        self.rows = compute_budget(counts, &book)?;
        Ok(self.rows.as_slice())
    }

    pub fn is_waiting(&self) -> bool {
        self.correlator.is_tracking()
    }

    pub fn current_job(&self) -> Option<&JobId> {
        self.correlator.current()
    }

    pub fn counts(&self) -> Option<&ElementCounts> {
        self.counts.as_ref()
    }

    pub fn rows(&self) -> &[BudgetRow] {
        &self.rows
    }

    /// Replace the container's budgets with the current rows.
    pub async fn push<C>(&self, catalog: &C, cost_container_id: &str) -> Result<(), CoreError>
    where
        C: BudgetCatalog + ?Sized,
    {
        push_to_remote_budget(catalog, cost_container_id, &self.rows).await
    }

    /// Adopt the container's unit prices into the price book and reprice
    /// the current rows.
    pub async fn pull<C, P>(
        &mut self,
        catalog: &C,
        price_book: &P,
        cost_container_id: &str,
    ) -> Result<PullOutcome, CoreError>
    where
        C: BudgetCatalog + ?Sized,
        P: PriceBookStore + ?Sized,
    {
        pull_from_remote_budget(catalog, price_book, cost_container_id, &mut self.rows).await
    }
}
