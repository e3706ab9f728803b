//! In-process [`AccountStore`] for tests and database-less development.
//!
//! Mirrors the PostgreSQL semantics that callers depend on: case-insensitive
//! email uniqueness enforced at insert time, generated ids, and `updated_at`
//! bumped on every mutation.

use async_trait::async_trait;
use chrono::Utc;
use resonant_core::account::DUPLICATE_EMAIL_MESSAGE;
use resonant_core::error::CoreError;
use resonant_core::types::DbId;
use tokio::sync::RwLock;

use super::account_repo::AccountStore;
use crate::models::account::{Account, AccountChanges, NewAccount};

#[derive(Default)]
pub struct MemoryAccountStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: DbId,
    rows: Vec<Account>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored rows, oldest first.
    pub async fn all(&self) -> Vec<Account> {
        self.inner.read().await.rows.clone()
    }

    pub async fn find_by_id(&self, id: DbId) -> Option<Account> {
        self.inner
            .read()
            .await
            .rows
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn exists(&self, email: &str) -> Result<bool, CoreError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .find(|a| same_email(&a.email, email))
            .cloned())
    }

    async fn create(&self, input: &NewAccount) -> Result<Account, CoreError> {
        let mut inner = self.inner.write().await;
        if inner.rows.iter().any(|a| same_email(&a.email, &input.email)) {
            return Err(CoreError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let account = Account {
            id: inner.next_id,
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            account_type: input.account_type.as_str().to_string(),
            agree_to_terms: input.agree_to_terms,
            agree_to_marketing: input.agree_to_marketing,
            voice_sample_id: None,
            created_at: now,
            updated_at: now,
        };
        inner.rows.push(account.clone());
        Ok(account)
    }

    async fn update(&self, id: DbId, changes: &AccountChanges) -> Result<(), CoreError> {
        let mut inner = self.inner.write().await;
        let account = inner
            .rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Account",
                id: id.to_string(),
            })?;

        if let Some(sample_id) = &changes.voice_sample_id {
            account.voice_sample_id = Some(sample_id.clone());
        }
        if let Some(kind) = changes.account_type {
            account.account_type = kind.as_str().to_string();
        }
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn ping(&self) -> Result<(), CoreError> {
        Ok(())
    }
}
