//! Handlers for cookie-based browser sessions under `/auth/session`.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::auth::{LoginRequest, UserInfo};
use crate::config::SessionCookieConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{cookie_value, SessionUser};
use crate::state::AppState;

/// Response body for `POST /auth/session`.
///
/// The CSRF token must be sent back in the `x-csrf-token` header on every
/// session-authenticated request.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub csrf_token: String,
    pub user: UserInfo,
}

/// POST /api/v1/auth/session
///
/// Authenticate and open a server-side session. The session id is set as an
/// `HttpOnly` cookie.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Response> {
    let (principal, session) = state
        .auth
        .sign_in_session(&input.login, &input.password)
        .await?;

    let ttl_secs = state.auth.sessions().ttl().as_secs();
    let cookie = session_cookie(&state.config.session, &session.session_id, ttl_secs)?;

    let body = SessionResponse {
        csrf_token: session.csrf_token,
        user: UserInfo::from(&principal),
    };

    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /api/v1/auth/session/logout
///
/// Delete the session named by the cookie, if any, and clear the cookie.
/// Succeeds even when no valid session is presented.
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(session_id) = cookie_value(&headers, &state.config.session.cookie_name) {
        state.auth.sign_out(&session_id).await;
    }

    let cookie = session_cookie(&state.config.session, "", 0)?;
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)]).into_response())
}

/// GET /api/v1/auth/session/me
pub async fn me(user: SessionUser) -> Json<UserInfo> {
    Json(UserInfo::from(&user.principal))
}

/// Build the `Set-Cookie` value for the session cookie.
fn session_cookie(
    config: &SessionCookieConfig,
    value: &str,
    max_age_secs: u64,
) -> AppResult<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict",
        config.cookie_name, value, max_age_secs
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::InternalError(format!("Invalid session cookie: {e}")))
}
