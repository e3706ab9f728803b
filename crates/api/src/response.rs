//! Shared response envelope types for API handlers.
//!
//! Every endpoint except signup and health answers with a `{ "data": ... }`
//! envelope.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
