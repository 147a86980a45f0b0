//! Object storage references.
//!
//! A model version points at its file with a storage URN of the form
//! `urn:adsk.objects:os.object:<bucket>/<object>`. The design automation
//! engine needs a plain HTTP URL instead.

use crate::api::ForgeApiError;

const STORAGE_URN_PREFIX: &str = "urn:adsk.objects:os.object:";

/// Bucket and object key parsed from a storage URN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub object: String,
}

impl ObjectLocation {
    pub fn parse(urn: &str) -> Result<Self, ForgeApiError> {
        let rest = urn
            .strip_prefix(STORAGE_URN_PREFIX)
            .ok_or_else(|| ForgeApiError::InvalidRequest(format!("Not a storage URN: {urn}")))?;

        match rest.split_once('/') {
            Some((bucket, object)) if !bucket.is_empty() && !object.is_empty() => Ok(Self {
                bucket: bucket.to_string(),
                object: object.to_string(),
            }),
            _ => Err(ForgeApiError::InvalidRequest(format!(
                "Storage URN has no bucket/object part: {urn}"
            ))),
        }
    }

    /// Download URL on the object storage service at `base_url`.
    pub fn object_url(&self, base_url: &str) -> String {
        format!(
            "{}/oss/v2/buckets/{}/objects/{}",
            base_url.trim_end_matches('/'),
            self.bucket,
            urlencoding::encode(&self.object)
        )
    }
}
