//! Repository layer for account persistence.

pub mod account_repo;
pub mod memory;

pub use account_repo::{AccountRepo, AccountStore, PgAccountStore};
pub use memory::MemoryAccountStore;
