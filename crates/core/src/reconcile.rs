//! Resolve symbolic labels on extracted records to catalog ids, then
//! submit the records to the asset catalog.
//!
//! What happens when a label has no match is decided per entity kind by
//! a [`ReconcilePolicy`]. The default mirrors how the asset service has
//! always been fed: missing categories are created, missing statuses
//! fall back to the first status of the project. That asymmetry is
//! probably unintended and should be raised with the product owner
//! rather than changed here.

use serde::Serialize;

use crate::batch::{submit_in_chunks, BatchOutcome, MAX_BATCH_SIZE};
use crate::catalog::AssetCatalog;
use crate::error::CoreError;
use crate::records::{AssetPayload, CatalogCategory, CatalogStatus, ExtractedRecord, NewCategory};
use crate::types::CatalogId;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// What to do with a label that matches no catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingLabelPolicy {
    /// Create the entry and use its id.
    CreateIfMissing,
    /// Use the first entry the catalog returned.
    FallbackToDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcilePolicy {
    pub category: MissingLabelPolicy,
    pub status: MissingLabelPolicy,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            category: MissingLabelPolicy::CreateIfMissing,
            status: MissingLabelPolicy::FallbackToDefault,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "camelCase")]
pub enum ReconcileOutcome {
    /// Categories or statuses could not be fetched. Nothing was changed.
    CatalogUnavailable { error: String },
    /// A label could not be resolved. Categories created before the
    /// failure remain in the catalog; no assets were submitted.
    Unresolved {
        error: String,
        categories_created: usize,
    },
    /// Labels resolved; `batch` says how much of the submission landed.
    Submitted {
        categories_created: usize,
        batch: BatchOutcome,
    },
}

impl ReconcileOutcome {
    /// `true` only when every record reached the catalog.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Submitted { batch, .. } if batch.is_complete())
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct CatalogReconciler<'a, C: AssetCatalog + ?Sized> {
    catalog: &'a C,
    policy: ReconcilePolicy,
    chunk_size: usize,
}

impl<'a, C: AssetCatalog + ?Sized> CatalogReconciler<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            policy: ReconcilePolicy::default(),
            chunk_size: MAX_BATCH_SIZE,
        }
    }

    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Resolve every record's labels against the project's catalog and
    /// submit the result.
    pub async fn reconcile(&self, project_id: &str, records: &[ExtractedRecord]) -> ReconcileOutcome {
        let (mut categories, statuses) = match self.fetch_catalog(project_id).await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!(project_id, error = %e, "Failed to fetch asset catalog");
                return ReconcileOutcome::CatalogUnavailable {
                    error: e.to_string(),
                };
            }
        };

        let mut created = 0;
        let mut payloads = Vec::with_capacity(records.len());
        for record in records {
            let resolved = match self
                .resolve_category(project_id, &record.category, &mut categories)
                .await
            {
                Ok((id, was_created)) => {
                    if was_created {
                        created += 1;
                    }
                    self.resolve_status(&record.status, &statuses)
                        .map(|status_id| record.resolved(id, status_id))
                }
                Err(e) => Err(e),
            };

            match resolved {
                Ok(payload) => payloads.push(payload),
                Err(e) => {
                    tracing::error!(
                        project_id,
                        asset = %record.client_asset_id,
                        error = %e,
                        "Failed to resolve asset labels",
                    );
                    return ReconcileOutcome::Unresolved {
                        error: e.to_string(),
                        categories_created: created,
                    };
                }
            }
        }

        let batch = self.submit(project_id, payloads).await;
        tracing::info!(
            project_id,
            records = records.len(),
            categories_created = created,
            succeeded = batch.succeeded_count,
            complete = batch.is_complete(),
            "Asset reconciliation finished",
        );

        ReconcileOutcome::Submitted {
            categories_created: created,
            batch,
        }
    }

    async fn fetch_catalog(
        &self,
        project_id: &str,
    ) -> Result<(Vec<CatalogCategory>, Vec<CatalogStatus>), CoreError> {
        let categories = self.catalog.list_categories(project_id).await?;
        let statuses = self.catalog.list_statuses(project_id).await?;
        Ok((categories, statuses))
    }

    /// Returns the category id and whether it had to be created.
    ///
    /// Created categories are appended to `categories` so later records
    /// with the same label reuse them.
    async fn resolve_category(
        &self,
        project_id: &str,
        label: &str,
        categories: &mut Vec<CatalogCategory>,
    ) -> Result<(CatalogId, bool), CoreError> {
        if let Some(found) = categories.iter().find(|c| c.name == label) {
            return Ok((found.id.clone(), false));
        }

        let first = categories.first().ok_or_else(|| CoreError::NoMatch {
            kind: "category",
            label: label.to_string(),
        })?;

        match self.policy.category {
            MissingLabelPolicy::FallbackToDefault => Ok((first.id.clone(), false)),
            MissingLabelPolicy::CreateIfMissing => {
                let request = NewCategory {
                    parent_id: first.id.clone(),
                    name: label.to_string(),
                };
                let category = self.catalog.create_category(project_id, &request).await?;
                tracing::info!(project_id, name = %label, id = %category.id, "Created asset category");
                let id = category.id.clone();
                categories.push(category);
                Ok((id, true))
            }
        }
    }

    fn resolve_status(&self, label: &str, statuses: &[CatalogStatus]) -> Result<CatalogId, CoreError> {
        if let Some(found) = statuses.iter().find(|s| s.label == label) {
            return Ok(found.id.clone());
        }

        let no_match = || CoreError::NoMatch {
            kind: "status",
            label: label.to_string(),
        };

        match self.policy.status {
            MissingLabelPolicy::FallbackToDefault => {
                let first = statuses.first().ok_or_else(no_match)?;
                tracing::debug!(label, fallback = %first.label, "Status label not found, using first status");
                Ok(first.id.clone())
            }
            // Statuses live inside status sets; there is no per-status create.
            MissingLabelPolicy::CreateIfMissing => Err(no_match()),
        }
    }

    async fn submit(&self, project_id: &str, payloads: Vec<AssetPayload>) -> BatchOutcome {
        submit_in_chunks(self.catalog, project_id, payloads, self.chunk_size).await
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::test_support::FakeAssetCatalog;

    use super::*;

    fn record(id: &str, category: &str, status: &str) -> ExtractedRecord {
        ExtractedRecord {
            client_asset_id: id.into(),
            category: category.into(),
            status: status.into(),
            description: format!("{id} description"),
            barcode: None,
            manufacturer: None,
            model: None,
        }
    }

    fn seeded_catalog() -> FakeAssetCatalog {
        FakeAssetCatalog::default()
            .with_category("10", "Root")
            .with_category("11", "Air Terminals")
            .with_status("s1", "Planned")
            .with_status("s2", "Installed")
    }

    #[tokio::test]
    async fn known_labels_resolve_to_ids() {
        let catalog = seeded_catalog();
        let outcome = CatalogReconciler::new(&catalog)
            .reconcile("p", &[record("A", "Air Terminals", "Installed")])
            .await;

        assert!(outcome.is_success());
        let submitted = catalog.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].category_id, "11");
        assert_eq!(submitted[0].status_id, "s2");
        assert!(catalog.created_categories().is_empty());
    }

    #[tokio::test]
    async fn unknown_status_falls_back_to_first() {
        let catalog = seeded_catalog();
        CatalogReconciler::new(&catalog)
            .reconcile("p", &[record("A", "Root", "Decommissioned")])
            .await;

        assert_eq!(catalog.submitted()[0].status_id, "s1");
    }

    #[tokio::test]
    async fn shared_missing_category_is_created_once() {
        let catalog = seeded_catalog();
        let records = [
            record("A", "Dampers", "Planned"),
            record("B", "Dampers", "Planned"),
            record("C", "Air Terminals", "Planned"),
        ];

        let outcome = CatalogReconciler::new(&catalog).reconcile("p", &records).await;

        assert_matches!(outcome, ReconcileOutcome::Submitted { categories_created: 1, .. });
        let created = catalog.created_categories();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "Dampers");
        assert_eq!(created[0].parent_id, "10");
        let submitted = catalog.submitted();
        assert_eq!(submitted[0].category_id, submitted[1].category_id);
    }

    #[tokio::test]
    async fn category_match_is_case_sensitive() {
        let catalog = seeded_catalog();
        CatalogReconciler::new(&catalog)
            .reconcile("p", &[record("A", "air terminals", "Planned")])
            .await;

        assert_eq!(catalog.created_categories().len(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_stops_before_any_write() {
        let catalog = seeded_catalog().failing_statuses();
        let outcome = CatalogReconciler::new(&catalog)
            .reconcile("p", &[record("A", "Dampers", "Planned")])
            .await;

        assert_matches!(outcome, ReconcileOutcome::CatalogUnavailable { .. });
        assert!(catalog.created_categories().is_empty());
        assert!(catalog.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn category_create_failure_submits_nothing() {
        let catalog = seeded_catalog().failing_category_create();
        let outcome = CatalogReconciler::new(&catalog)
            .reconcile("p", &[record("A", "Dampers", "Planned")])
            .await;

        assert!(!outcome.is_success());
        assert_matches!(outcome, ReconcileOutcome::Unresolved { .. });
        assert!(catalog.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn empty_status_set_is_a_no_match() {
        let catalog = FakeAssetCatalog::default().with_category("10", "Root");
        let outcome = CatalogReconciler::new(&catalog)
            .reconcile("p", &[record("A", "Root", "Planned")])
            .await;

        assert_matches!(outcome, ReconcileOutcome::Unresolved { ref error, .. } if error.contains("status"));
    }

    #[tokio::test]
    async fn fallback_policy_for_categories_creates_nothing() {
        let catalog = seeded_catalog();
        let policy = ReconcilePolicy {
            category: MissingLabelPolicy::FallbackToDefault,
            status: MissingLabelPolicy::FallbackToDefault,
        };
        CatalogReconciler::new(&catalog)
            .with_policy(policy)
            .reconcile("p", &[record("A", "Dampers", "Planned")])
            .await;

        assert!(catalog.created_categories().is_empty());
        assert_eq!(catalog.submitted()[0].category_id, "10");
    }

    #[tokio::test]
    async fn partial_submission_is_reported() {
        let catalog = seeded_catalog().failing_batch(2);
        let records: Vec<_> = (0..230)
            .map(|i| record(&format!("A-{i}"), "Root", "Planned"))
            .collect();

        let outcome = CatalogReconciler::new(&catalog).reconcile("p", &records).await;

        assert!(!outcome.is_success());
        match outcome {
            ReconcileOutcome::Submitted { batch, .. } => {
                assert_eq!(batch.succeeded_count, 200);
                assert_eq!(batch.failed_chunk_index, Some(2));
                assert_eq!(batch.remaining.len(), 30);
            }
            other => panic!("Expected Submitted, got {other:?}"),
        }
    }
}
