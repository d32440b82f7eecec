//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{auth, session};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login            -> login
/// POST /signup           -> signup
/// POST /refresh          -> refresh
/// GET  /me               -> me (bearer)
/// POST /session          -> session sign-in
/// POST /session/logout   -> session sign-out
/// GET  /session/me       -> me (cookie + CSRF)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/refresh", post(auth::refresh))
        .route("/me", get(auth::me))
        .route("/session", post(session::sign_in))
        .route("/session/logout", post(session::sign_out))
        .route("/session/me", get(session::me))
}
