//! Shared response envelope for API handlers.
//!
//! Every successful JSON response is `{ "data": ... }`. The client crate
//! unwraps the same envelope.

use serde::{Deserialize, Serialize};

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}
