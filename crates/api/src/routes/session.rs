//! Route definitions for the `/session` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::session;
use crate::state::AppState;

/// Routes mounted at `/session`.
///
/// ```text
/// GET  /         -> current
/// POST /logout   -> logout (requires session)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(session::current))
        .route("/logout", post(session::logout))
}
