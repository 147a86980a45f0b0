//! Extracted asset records and the catalog entities they resolve against.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{deserialize_catalog_id, deserialize_optional_catalog_id, CatalogId};

// ---------------------------------------------------------------------------
// Extraction output
// ---------------------------------------------------------------------------

/// Result payload of the asset extractor.
///
/// `{ "Workitem": "...", "AssetList": [ { "Id", "CategoryId", ... } ] }`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssetCollection {
    #[serde(default)]
    pub workitem: String,
    #[serde(default)]
    pub asset_list: Vec<AssetInfo>,
}

/// One asset as written by the extractor. `CategoryId` and `StatusId`
/// hold human-readable labels here, not catalog ids.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AssetInfo {
    pub id: String,
    pub category_id: String,
    pub status_id: String,
    pub manufacturer: String,
    pub model: String,
    pub description: String,
    pub barcode: String,
}

impl AssetCollection {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Malformed asset result: {e}")))
    }

    /// Convert into table records ready for reconciliation.
    pub fn into_records(self) -> Vec<ExtractedRecord> {
        self.asset_list.into_iter().map(ExtractedRecord::from).collect()
    }
}

// ---------------------------------------------------------------------------
// ExtractedRecord
// ---------------------------------------------------------------------------

/// One row of extracted asset data with symbolic labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    pub client_asset_id: String,
    /// Category name, resolved to a catalog id during reconciliation.
    pub category: String,
    /// Status label, resolved to a catalog id during reconciliation.
    pub status: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl From<AssetInfo> for ExtractedRecord {
    fn from(info: AssetInfo) -> Self {
        Self {
            client_asset_id: info.id,
            category: info.category_id,
            status: info.status_id,
            description: info.description,
            barcode: non_empty(info.barcode),
            manufacturer: non_empty(info.manufacturer),
            model: non_empty(info.model),
        }
    }
}

impl ExtractedRecord {
    /// Attach resolved catalog ids, producing the batch-create payload.
    pub fn resolved(&self, category_id: CatalogId, status_id: CatalogId) -> AssetPayload {
        AssetPayload {
            client_asset_id: self.client_asset_id.clone(),
            category_id,
            status_id,
            description: self.description.clone(),
            barcode: self.barcode.clone(),
        }
    }
}

/// Body item of the asset batch-create endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPayload {
    pub client_asset_id: String,
    pub category_id: CatalogId,
    pub status_id: CatalogId,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

// ---------------------------------------------------------------------------
// Catalog entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCategory {
    #[serde(deserialize_with = "deserialize_catalog_id")]
    pub id: CatalogId,
    pub name: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_catalog_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<CatalogId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStatus {
    #[serde(deserialize_with = "deserialize_catalog_id")]
    pub id: CatalogId,
    pub label: String,
}

/// Request body for creating a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub parent_id: CatalogId,
    pub name: String,
}
