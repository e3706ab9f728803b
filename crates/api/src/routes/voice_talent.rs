//! Route definitions for the `/voice-talent` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::voice_talent;
use crate::state::AppState;

/// Routes mounted at `/voice-talent`. All require a session.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/applications", post(voice_talent::create_application))
        .route(
            "/applications/{id}",
            get(voice_talent::get_application)
                .delete(voice_talent::exit_application),
        )
        .route("/applications/{id}/sample", put(voice_talent::upload_sample))
        .route(
            "/applications/{id}/recording/start",
            post(voice_talent::start_recording),
        )
        .route(
            "/applications/{id}/recording",
            put(voice_talent::finish_recording),
        )
        .route("/applications/{id}/profile", put(voice_talent::update_profile))
        .route("/applications/{id}/advance", post(voice_talent::advance))
        .route("/applications/{id}/back", post(voice_talent::go_back))
        .route("/applications/{id}/submit", post(voice_talent::submit))
}
