//! Chunked submission to the asset batch-create endpoint.

use serde::{Deserialize, Serialize};

use crate::catalog::AssetCatalog;
use crate::records::AssetPayload;

/// The batch-create endpoint accepts at most this many items per call.
pub const MAX_BATCH_SIZE: usize = 100;

/// How far a chunked submission got.
///
/// Chunks are sent in order and the first failure stops the run. Chunks
/// sent before it are not rolled back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchOutcome {
    /// Number of records accepted by successful chunks.
    pub succeeded_count: usize,
    /// Number of batch-create calls issued, including a failed one.
    pub calls_issued: usize,
    /// Index of the chunk that failed, if any.
    pub failed_chunk_index: Option<usize>,
    /// Records of the failed chunk and every chunk after it.
    pub remaining: Vec<AssetPayload>,
    /// Diagnostic of the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed_chunk_index.is_none()
    }
}

/// Submit `assets` in chunks of at most `chunk_size`, sequentially.
///
/// Issues exactly `ceil(len / chunk_size)` calls when everything
/// succeeds and none after the first failure.
pub async fn submit_in_chunks<C>(
    catalog: &C,
    project_id: &str,
    assets: Vec<AssetPayload>,
    chunk_size: usize,
) -> BatchOutcome
where
    C: AssetCatalog + ?Sized,
{
    let chunk_size = chunk_size.clamp(1, MAX_BATCH_SIZE);
    let mut outcome = BatchOutcome::default();

    for (index, chunk) in assets.chunks(chunk_size).enumerate() {
        outcome.calls_issued += 1;
        match catalog.batch_create_assets(project_id, chunk).await {
            Ok(()) => {
                outcome.succeeded_count += chunk.len();
                tracing::debug!(project_id, chunk = index, size = chunk.len(), "Asset chunk created");
            }
            Err(e) => {
                tracing::error!(
                    project_id,
                    chunk = index,
                    succeeded = outcome.succeeded_count,
                    error = %e,
                    "Asset batch-create failed, stopping",
                );
                outcome.failed_chunk_index = Some(index);
                outcome.remaining = assets[index * chunk_size..].to_vec();
                outcome.error = Some(e.to_string());
                break;
            }
        }
    }

    outcome
}
