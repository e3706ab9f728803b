//! Publisher response parsing.
//!
//! A store call answers in one of two shapes:
//!
//! ```text
//! { "newlyCreated":     { "blobObject": { "blobId": "..." , ... }, ... } }
//! { "alreadyCertified": { "blobId": "...", ... } }
//! ```
//!
//! The second appears when identical content was stored before, since the
//! publish call is idempotent.

use resonant_core::ingest::ContentId;

/// Pull the blob identifier out of a publisher response, if present.
pub fn extract_blob_id(payload: &serde_json::Value) -> Option<ContentId> {
    payload
        .pointer("/newlyCreated/blobObject/blobId")
        .or_else(|| payload.pointer("/alreadyCertified/blobId"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ContentId::new)
}
