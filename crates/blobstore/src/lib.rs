//! Client for the external blob publisher that stores voice samples.
//!
//! - [`publisher`] -- HTTP client implementing
//!   [`resonant_core::ingest::SampleIngestor`].
//! - [`response`] -- extraction of the blob identifier from publisher
//!   responses.

pub mod publisher;
pub mod response;

pub use publisher::{BlobConfig, BlobPublisher};
