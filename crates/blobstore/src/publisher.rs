//! HTTP client for the blob publisher.
//!
//! Stores a voice sample with a single `PUT /v1/blobs` call using
//! [`reqwest`]. The call is not retried here; the caller decides what a
//! failure means.

use std::time::Duration;

use async_trait::async_trait;
use resonant_core::ingest::{IngestionError, IngestionReceipt, SampleIngestor};
use resonant_core::onboarding::Sample;

use crate::response::extract_blob_id;

/// Public testnet publisher used when `BLOB_PUBLISHER_URL` is unset.
pub const DEFAULT_PUBLISHER_URL: &str = "https://publisher.walrus-testnet.walrus.space";

/// Publisher endpoint configuration.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Base URL without trailing slash, e.g. `http://localhost:31415`.
    pub publisher_url: String,
    /// Storage duration in epochs; the publisher default applies when `None`.
    pub epochs: Option<u32>,
}

impl BlobConfig {
    /// Load publisher configuration from environment variables.
    ///
    /// | Env Var              | Default                                         |
    /// |----------------------|-------------------------------------------------|
    /// | `BLOB_PUBLISHER_URL` | `https://publisher.walrus-testnet.walrus.space` |
    /// | `BLOB_EPOCHS`        | unset (publisher default)                       |
    pub fn from_env() -> Self {
        let publisher_url = std::env::var("BLOB_PUBLISHER_URL")
            .unwrap_or_else(|_| DEFAULT_PUBLISHER_URL.into())
            .trim_end_matches('/')
            .to_string();

        let epochs = std::env::var("BLOB_EPOCHS").ok().map(|v| {
            v.parse::<u32>()
                .expect("BLOB_EPOCHS must be a valid u32")
        });

        Self {
            publisher_url,
            epochs,
        }
    }
}

/// Stores samples on the blob publisher.
pub struct BlobPublisher {
    client: reqwest::Client,
    config: BlobConfig,
}

impl BlobPublisher {
    /// Build a publisher client whose every request is bounded by `timeout`.
    pub fn new(config: BlobConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn blobs_url(&self) -> String {
        format!("{}/v1/blobs", self.config.publisher_url)
    }
}

#[async_trait]
impl SampleIngestor for BlobPublisher {
    async fn submit(&self, sample: &Sample) -> Result<IngestionReceipt, IngestionError> {
        let mut request = self
            .client
            .put(self.blobs_url())
            .header(reqwest::header::CONTENT_TYPE, sample.content_type())
            .body(sample.bytes().to_vec());
        if let Some(epochs) = self.config.epochs {
            request = request.query(&[("epochs", epochs)]);
        }

        let response = request.send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(IngestionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(request_error)?;
        let payload: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| IngestionError::InvalidResponse(e.to_string()))?;

        let content_id = extract_blob_id(&payload);
        tracing::debug!(
            size_bytes = sample.bytes().len(),
            content_id = content_id.as_ref().map(|c| c.as_str()),
            "Voice sample stored"
        );

        Ok(IngestionReceipt {
            content_id,
            payload,
        })
    }
}

fn request_error(err: reqwest::Error) -> IngestionError {
    if err.is_timeout() {
        IngestionError::Timeout
    } else {
        IngestionError::Request(err.to_string())
    }
}
