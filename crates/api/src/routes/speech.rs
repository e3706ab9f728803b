//! Route definitions for the `/speech` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::speech;
use crate::state::AppState;

/// Routes mounted at `/speech`.
///
/// ```text
/// GET  /voices     -> list_voices
/// POST /generate   -> generate (requires session)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/voices", get(speech::list_voices))
        .route("/generate", post(speech::generate))
}
