//! Domain types and rules shared by the Resonant backend crates.
//!
//! Everything here is free of I/O: the account and ingestion seams are
//! expressed as traits or plain data so the api crate can wire real
//! implementations and tests can substitute fakes.

pub mod account;
pub mod error;
pub mod ingest;
pub mod onboarding;
pub mod session;
pub mod signup;
pub mod speech;
pub mod types;
