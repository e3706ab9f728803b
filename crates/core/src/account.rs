//! Account categories.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Message returned whenever an email is already registered, whether the
/// pre-check or the storage constraint caught it.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "An account with this email already exists";

/// The category an account was registered under.
///
/// The signup form historically posted `user` / `talent`, so both spellings
/// are accepted on input. Output always uses the database names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    #[serde(alias = "user")]
    Regular,
    #[serde(alias = "talent")]
    VoiceTalent,
}

impl AccountType {
    /// Parse an account type string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "regular" => Ok(Self::Regular),
            "voice_talent" => Ok(Self::VoiceTalent),
            _ => Err(CoreError::Validation(format!(
                "Invalid account type '{s}'. Must be one of: regular, voice_talent"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::VoiceTalent => "voice_talent",
        }
    }

    /// Where the client should land after a successful signup.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Self::Regular => "/dashboard",
            Self::VoiceTalent => "/voice-talent/dashboard",
        }
    }
}
