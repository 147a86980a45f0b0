use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a remote job (a design-automation workitem).
///
/// Assigned by the remote compute service; never parsed locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque catalog identifier (category, status, budget line).
pub type CatalogId = String;

/// Accept catalog ids encoded either as JSON strings or numbers.
///
/// The asset and cost services are not consistent about this.
pub fn deserialize_catalog_id<'de, D>(deserializer: D) -> Result<CatalogId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Optional variant of [`deserialize_catalog_id`].
pub fn deserialize_optional_catalog_id<'de, D>(
    deserializer: D,
) -> Result<Option<CatalogId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_catalog_id")] CatalogId);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}
