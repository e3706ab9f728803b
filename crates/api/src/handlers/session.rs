//! Handlers for the `/session` resource (gate view, logout).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use resonant_core::session::{evaluate_gate, GateView};

use crate::error::AppResult;
use crate::middleware::session::{bearer_token, Session};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/session
///
/// Report what the gate lets the caller see. The token is optional; a
/// malformed or invalid one yields the sign-in view.
pub async fn current(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataResponse<GateView>>> {
    let token = bearer_token(&headers).ok().flatten();

    let snapshot = state.identity.snapshot(token).await?;
    let view = evaluate_gate(&snapshot, state.identity.login_url());
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/session/logout
///
/// End the caller's session; the token is rejected from then on.
pub async fn logout(State(state): State<AppState>, session: Session) -> AppResult<StatusCode> {
    state.identity.logout(session.token()).await?;
    Ok(StatusCode::NO_CONTENT)
}
