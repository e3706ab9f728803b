//! Session gate extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use resonant_core::error::CoreError;
use resonant_core::session::IdentityUser;
use resonant_core::signup::normalize_email;
use resonant_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// A signed-in caller, resolved from the `Authorization: Bearer` header.
///
/// Rejects with 503 while the identity provider is not ready and 401 for a
/// missing, invalid or revoked token.
///
/// ```ignore
/// async fn my_handler(session: Session) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %session.user.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    pub user: IdentityUser,
    /// The caller's own account, matched by email. `None` when the identity
    /// carries no email or no account was registered with it.
    pub account_id: Option<DbId>,
    token: String,
}

impl Session {
    /// The bearer token this session was resolved from.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Read the bearer token, if any. A malformed header is an error; an absent
/// one is not.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get("authorization") else {
        return Ok(None);
    };
    let header = value.to_str().map_err(|_| invalid_format())?;
    let token = header.strip_prefix("Bearer ").ok_or_else(invalid_format)?;
    Ok(Some(token.trim()))
}

fn invalid_format() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid Authorization format. Expected: Bearer <token>".into(),
    ))
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.identity.is_ready() {
            return Err(AppError::Core(CoreError::Unavailable(
                "Identity provider is not ready".into(),
            )));
        }

        let token = bearer_token(&parts.headers)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

        let user = state.identity.resolve(token).await?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let account_id = match user.email.as_deref() {
            Some(email) => state
                .accounts
                .find_by_email(&normalize_email(email))
                .await?
                .map(|account| account.id),
            None => None,
        };

        Ok(Session {
            user,
            account_id,
            token: token.to_string(),
        })
    }
}
