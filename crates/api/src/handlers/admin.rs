//! Administrative user management.
//!
//! Creating accounts with elevated roles requires an admin; looking users up
//! requires a moderator.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use credence_core::error::CoreError;
use credence_core::roles::Role;
use credence_core::types::DbId;
use serde::Deserialize;

use super::auth::{register, SignupRequest, UserInfo};
use crate::auth::Principal;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireModerator};
use crate::state::AppState;

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// POST /api/v1/admin/users
///
/// Create a user with an explicit role. Callers cannot grant a role above
/// their own.
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    if !admin.0.role.at_least(input.role) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Cannot grant role {}",
            input.role
        ))));
    }

    let role = input.role;
    let principal = register(
        &state,
        SignupRequest {
            username: input.username,
            email: input.email,
            password: input.password,
        },
        role,
    )
    .await?;

    tracing::info!(
        admin_id = admin.0.user_id,
        user_id = principal.user_id,
        role = %role,
        "Admin created user",
    );

    Ok((StatusCode::CREATED, Json(UserInfo::from(&principal))))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    RequireModerator(_): RequireModerator,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserInfo>> {
    let user = state
        .auth
        .users()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "User",
            id,
        }))?;

    let principal = Principal::try_from(&user)?;
    Ok(Json(UserInfo::from(&principal)))
}
