//! Storage seam for authentication.
//!
//! [`UserStore`] is the only view of user persistence that the auth
//! subsystem depends on. [`PgUserStore`] backs it with PostgreSQL via
//! [`UserRepo`]; [`MemoryUserStore`] keeps users in a map for local
//! development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use credence_core::types::DbId;
use credence_db::models::user::{CreateUser, User};
use credence_db::repositories::UserRepo;
use credence_db::DbPool;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique field (`"username"` or `"email"`) is already taken.
    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user whose username or email equals `identifier`.
    async fn find_by_login_or_email(&self, identifier: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;

    async fn create(&self, input: &CreateUser) -> Result<User, StoreError>;

    /// Verify the backing store is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// PostgreSQL-backed [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_login_or_email(&self, identifier: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_login_or_email(&self.pool, identifier).await?)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        UserRepo::create(&self.pool, input)
            .await
            .map_err(classify_unique_violation)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(credence_db::health_check(&self.pool).await?)
    }
}

/// Map PostgreSQL unique violations (code 23505) on the `users` constraints
/// to [`StoreError::Duplicate`].
fn classify_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            match db_err.constraint() {
                Some("uq_users_username") => return StoreError::Duplicate("username"),
                Some("uq_users_email") => return StoreError::Duplicate("email"),
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

/// In-memory [`UserStore`].
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<DbId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_login_or_email(&self, identifier: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        let by_username = users.values().find(|u| u.username == identifier);
        let found = by_username.or_else(|| users.values().find(|u| u.email == identifier));
        Ok(found.cloned())
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == input.username) {
            return Err(StoreError::Duplicate("username"));
        }
        if users.values().any(|u| u.email == input.email) {
            return Err(StoreError::Duplicate("email"));
        }

        let id = users.keys().max().copied().unwrap_or(0) + 1;
        let now = chrono::Utc::now();
        let user = User {
            id,
            username: input.username.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            role: input.role.clone(),
            created_at: now,
            updated_at: now,
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
