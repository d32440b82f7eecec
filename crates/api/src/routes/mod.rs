pub mod admin;
pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                 bearer login (public)
/// /auth/signup                register + bearer login (public)
/// /auth/refresh               exchange refresh token (public)
/// /auth/me                    current principal (bearer)
///
/// /auth/session               cookie login (public)
/// /auth/session/logout        end session
/// /auth/session/me            current principal (cookie + CSRF)
///
/// /admin/users                create user with role (admin)
/// /admin/users/{id}           look up user (moderator)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
}
