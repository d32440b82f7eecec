//! Authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::{AuthError, Principal};
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the CSRF token on session-authenticated requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.0.user_id, role = %user.0.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let principal = state.auth.validate_bearer_token(token)?;
        Ok(AuthUser(principal))
    }
}

/// User resolved from the session cookie.
///
/// Every request must echo the session's CSRF token in the `x-csrf-token`
/// header, including reads.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub principal: Principal,
    pub session_id: String,
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_id = cookie_value(&parts.headers, &state.config.session.cookie_name)
            .ok_or(AuthError::SessionNotFound)?;

        let csrf = parts
            .headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let principal = state
            .auth
            .validate_session_cookie(&session_id, csrf)
            .await?;

        Ok(SessionUser {
            principal,
            session_id,
        })
    }
}

/// Find cookie `name` across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
