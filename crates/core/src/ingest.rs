//! Voice-sample ingestion seam.
//!
//! The api crate submits captured samples through [`SampleIngestor`]; the
//! blob-store crate provides the HTTP implementation.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::onboarding::Sample;

/// Opaque identifier the external store assigns to an ingested sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful ingestion call.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionReceipt {
    /// The identifier, when the response carried one at a known path.
    pub content_id: Option<ContentId>,
    /// Raw response body, shown back to the applicant.
    pub payload: serde_json::Value,
}

/// Ingestion failures. No variant is retried by the client.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    /// The request did not complete (network, DNS, TLS).
    #[error("Ingestion request failed: {0}")]
    Request(String),

    /// The request exceeded the configured external-call timeout.
    #[error("Ingestion request timed out")]
    Timeout,

    /// The store answered with a non-2xx status.
    #[error("Ingestion rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The store answered 2xx with a body that is not JSON.
    #[error("Ingestion response was not valid JSON: {0}")]
    InvalidResponse(String),
}

/// Submits a captured voice sample to an external object store.
#[async_trait]
pub trait SampleIngestor: Send + Sync {
    async fn submit(&self, sample: &Sample) -> Result<IngestionReceipt, IngestionError>;
}
