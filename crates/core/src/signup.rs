//! Signup form validation.
//!
//! Rules are checked in a fixed order and only the first violation is
//! reported, so the client always shows exactly one actionable message.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::account::AccountType;
use crate::error::CoreError;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Request body for `POST /auth/signup`.
///
/// Every field defaults when absent or `null`, so a missing field is
/// reported by [`validate_signup`] rather than rejected by the JSON
/// extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupForm {
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(deserialize_with = "null_as_default")]
    pub confirm_password: String,
    #[serde(deserialize_with = "null_as_default")]
    pub account_type: AccountType,
    #[serde(deserialize_with = "null_as_default")]
    pub agree_to_terms: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub agree_to_marketing: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The first signup rule a form violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignupViolation {
    #[error("All fields are required")]
    MissingField,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("You must agree to the terms of service")]
    TermsNotAccepted,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
}

impl From<SignupViolation> for CoreError {
    fn from(v: SignupViolation) -> Self {
        CoreError::Validation(v.to_string())
    }
}

/// Fields ready for persistence: email lower-cased, names trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSignup {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub account_type: AccountType,
    pub agree_to_terms: bool,
    pub agree_to_marketing: bool,
}

impl SignupForm {
    pub fn normalized(&self) -> NormalizedSignup {
        NormalizedSignup {
            email: normalize_email(&self.email),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            account_type: self.account_type,
            agree_to_terms: self.agree_to_terms,
            agree_to_marketing: self.agree_to_marketing,
        }
    }
}

/// Canonical form of an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check a signup form, returning the first violated rule.
///
/// Order: required fields, password match, terms, email shape, password
/// length.
pub fn validate_signup(form: &SignupForm) -> Result<(), SignupViolation> {
    let blank = |s: &str| s.trim().is_empty();
    if blank(&form.first_name)
        || blank(&form.last_name)
        || blank(&form.email)
        || form.password.is_empty()
        || form.confirm_password.is_empty()
    {
        return Err(SignupViolation::MissingField);
    }

    if form.password != form.confirm_password {
        return Err(SignupViolation::PasswordMismatch);
    }

    if !form.agree_to_terms {
        return Err(SignupViolation::TermsNotAccepted);
    }

    if !is_valid_email(&form.email) {
        return Err(SignupViolation::InvalidEmail);
    }

    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(SignupViolation::PasswordTooShort);
    }

    Ok(())
}

/// `local@domain.tld` shape check, ignoring surrounding whitespace.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}
