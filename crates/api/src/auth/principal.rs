use credence_core::roles::Role;
use credence_core::types::DbId;
use credence_db::models::user::User;
use serde::Serialize;

use super::AuthError;

/// An authenticated identity.
///
/// Immutable once derived; role changes only show up in a Principal derived
/// again from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: DbId,
    pub role: Role,
    pub username: String,
    pub email: String,
}

impl TryFrom<&User> for Principal {
    type Error = AuthError;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        let role = user
            .role
            .parse()
            .map_err(|e| AuthError::Internal(format!("user {}: {e}", user.id)))?;
        Ok(Principal {
            user_id: user.id,
            role,
            username: user.username.clone(),
            email: user.email.clone(),
        })
    }
}
