//! Handlers for the bearer-token `/auth` resource (login, signup, refresh, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use credence_core::error::CoreError;
use credence_core::roles::Role;
use credence_core::types::DbId;
use credence_db::models::user::CreateUser;
use serde::{Deserialize, Serialize};

use crate::auth::password::validate_password_strength;
use crate::auth::service::TokenPair;
use crate::auth::Principal;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login` and `POST /auth/session`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "username")]
    pub login: String,
    pub password: String,
}

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by login, signup and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

impl AuthResponse {
    fn new(principal: &Principal, tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            user: UserInfo::from(principal),
        }
    }
}

/// Public user info embedded in responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&Principal> for UserInfo {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.user_id,
            username: p.username.clone(),
            email: p.email.clone(),
            role: p.role,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with username or email plus password. Returns access and
/// refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (principal, tokens) = state
        .auth
        .sign_in_tokens(&input.login, &input.password)
        .await?;

    Ok(Json(AuthResponse::new(&principal, tokens)))
}

/// POST /api/v1/auth/signup
///
/// Register a new account with role `user` and sign it in.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let principal = register(&state, input, Role::User).await?;
    let tokens = state.auth.issue_tokens(&principal)?;

    tracing::info!(user_id = principal.user_id, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(&principal, tokens)),
    ))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (principal, tokens) = state.auth.refresh(&input.refresh_token).await?;
    Ok(Json(AuthResponse::new(&principal, tokens)))
}

/// GET /api/v1/auth/me
///
/// Return the principal carried by the bearer token.
pub async fn me(AuthUser(principal): AuthUser) -> Json<UserInfo> {
    Json(UserInfo::from(&principal))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Validate the input, hash the password and store a new user with `role`.
pub(crate) async fn register(
    state: &AppState,
    input: SignupRequest,
    role: Role,
) -> AppResult<Principal> {
    let username = input.username.trim().to_string();
    let email = input.email.trim().to_string();

    if username.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Username must not be empty".into(),
        )));
    }
    if !email.contains('@') {
        return Err(AppError::Core(CoreError::Validation(
            "Email address is invalid".into(),
        )));
    }
    validate_password_strength(&input.password, state.config.password.min_length)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = state.auth.hashing().hash(input.password).await?;

    let user = state
        .auth
        .users()
        .create(&CreateUser {
            username,
            email,
            password_hash,
            role: role.as_str().to_string(),
        })
        .await?;

    Ok(Principal::try_from(&user)?)
}
