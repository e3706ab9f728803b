//! Handlers for the `/auth` resource (account signup).

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use resonant_core::account::{AccountType, DUPLICATE_EMAIL_MESSAGE};
use resonant_core::error::CoreError;
use resonant_core::signup::{validate_signup, SignupForm};
use resonant_core::types::DbId;
use resonant_db::models::account::NewAccount;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Body of a successful signup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: SignupUser,
    /// Landing page for the new account's category.
    pub redirect_to: &'static str,
}

/// Public account info embedded in [`SignupResponse`]. Never carries the
/// password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupUser {
    pub id: DbId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub account_type: AccountType,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Validate the form, reject known emails, hash the password and create the
/// account. The unique index still decides races between two signups for
/// the same email; both paths answer with the same 409.
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupForm>, JsonRejection>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let Json(form) = payload?;

    // 1. Validate, reporting only the first violated rule.
    validate_signup(&form).map_err(CoreError::from)?;
    let fields = form.normalized();

    // 2. Reject an email that is already registered, in any letter case.
    if state.accounts.exists(&fields.email).await? {
        return Err(AppError::Core(CoreError::Conflict(
            DUPLICATE_EMAIL_MESSAGE.to_string(),
        )));
    }

    // 3. Hash on the blocking pool.
    let hasher = Arc::clone(&state.hasher);
    let password = form.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::InternalError(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // 4. Insert. A concurrent signup that won the race surfaces as Conflict.
    let account = state
        .accounts
        .create(&NewAccount {
            email: fields.email,
            password_hash,
            first_name: fields.first_name,
            last_name: fields.last_name,
            account_type: fields.account_type,
            agree_to_terms: fields.agree_to_terms,
            agree_to_marketing: fields.agree_to_marketing,
        })
        .await?;

    let account_type = account.kind()?;
    tracing::info!(
        account_id = account.id,
        account_type = account_type.as_str(),
        "Account created"
    );

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: true,
            message: "Account created successfully",
            redirect_to: account_type.landing_path(),
            user: SignupUser {
                id: account.id,
                email: account.email,
                first_name: account.first_name,
                last_name: account.last_name,
                account_type,
            },
        }),
    ))
}
