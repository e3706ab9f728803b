//! Account entity model and DTOs.

use resonant_core::account::AccountType;
use resonant_core::error::CoreError;
use resonant_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Full row from the `accounts` table.
///
/// Contains the password hash -- NEVER serialize this to API responses
/// directly; handlers build their own response types.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub account_type: String,
    pub agree_to_terms: bool,
    pub agree_to_marketing: bool,
    pub voice_sample_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Account {
    /// Parsed account category.
    pub fn kind(&self) -> Result<AccountType, CoreError> {
        AccountType::from_str_db(&self.account_type)
    }
}

/// DTO for inserting a new account. The email must already be normalized.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub account_type: AccountType,
    pub agree_to_terms: bool,
    pub agree_to_marketing: bool,
}

/// Partial update applied by onboarding. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountChanges {
    pub voice_sample_id: Option<String>,
    pub account_type: Option<AccountType>,
}

impl AccountChanges {
    /// Attach an ingested voice sample and mark the account as voice talent.
    pub fn voice_talent(sample_id: impl Into<String>) -> Self {
        Self {
            voice_sample_id: Some(sample_id.into()),
            account_type: Some(AccountType::VoiceTalent),
        }
    }
}
