pub mod auth;
pub mod health;
pub mod session;
pub mod speech;
pub mod voice_talent;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth
///     /signup                                POST create account
///
/// /session                                   GET gate view
///     /logout                                POST end session
///
/// /speech
///     /voices                                GET voice catalog
///     /generate                              POST demo generation (session)
///
/// /voice-talent/applications                 POST open (session)
///     /{id}                                  GET, DELETE
///     /{id}/sample                           PUT multipart upload
///     /{id}/recording/start                  POST
///     /{id}/recording                        PUT raw audio
///     /{id}/profile                          PUT
///     /{id}/advance                          POST
///     /{id}/back                             POST
///     /{id}/submit                           POST
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/session", session::router())
        .nest("/speech", speech::router())
        .nest("/voice-talent", voice_talent::router())
}
