//! Sign-in, sign-out, and credential validation.
//!
//! Two client types are served, and their security properties are kept apart:
//!
//! - API/native clients use stateless bearer tokens ([`AuthService::sign_in_tokens`],
//!   [`AuthService::validate_bearer_token`]). No CSRF check applies.
//! - Browsers use a server-side session referenced by a cookie and paired with
//!   a CSRF token ([`AuthService::sign_in_session`],
//!   [`AuthService::validate_session_cookie`]).

use std::sync::Arc;

use subtle::ConstantTimeEq;

use super::jwt::{
    generate_access_token, generate_refresh_token, validate_access_token,
    validate_refresh_token, JwtConfig,
};
use super::password::HashingPool;
use super::session::{NewSession, SessionStore};
use super::store::{StoreError, UserStore};
use super::{AuthError, Principal};

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Internal(format!("user store: {err}"))
    }
}

/// Access + refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtConfig,
    sessions: Arc<SessionStore>,
    hashing: HashingPool,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt: JwtConfig,
        sessions: Arc<SessionStore>,
        hashing: HashingPool,
    ) -> Self {
        Self {
            users,
            jwt,
            sessions,
            hashing,
        }
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    pub fn hashing(&self) -> &HashingPool {
        &self.hashing
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Check a login (username or email) and password.
    ///
    /// An unknown login and a wrong password both yield
    /// [`AuthError::InvalidCredentials`] after the same amount of hashing work.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Principal, AuthError> {
        let Some(user) = self.users.find_by_login_or_email(login).await? else {
            self.hashing.verify_dummy(password.to_string()).await;
            tracing::info!("Sign-in rejected: unknown login");
            return Err(AuthError::InvalidCredentials);
        };

        let verified = self
            .hashing
            .verify(password.to_string(), user.password_hash.clone())
            .await;
        if !verified {
            tracing::info!(user_id = user.id, "Sign-in rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        Principal::try_from(&user)
    }

    /// Sign in an API client, returning a fresh token pair.
    pub async fn sign_in_tokens(
        &self,
        login: &str,
        password: &str,
    ) -> Result<(Principal, TokenPair), AuthError> {
        let principal = self.authenticate(login, password).await?;
        let tokens = self.issue_tokens(&principal)?;
        tracing::info!(user_id = principal.user_id, "Signed in with tokens");
        Ok((principal, tokens))
    }

    pub fn issue_tokens(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        let access_token = generate_access_token(principal, &self.jwt)
            .map_err(|e| AuthError::Internal(format!("access token generation: {e}")))?;
        let refresh_token = generate_refresh_token(principal.user_id, &self.jwt)
            .map_err(|e| AuthError::Internal(format!("refresh token generation: {e}")))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt.access_ttl_secs(),
        })
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The principal is re-read from storage so role changes take effect.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(Principal, TokenPair), AuthError> {
        let claims = validate_refresh_token(refresh_token, &self.jwt)?;

        let Some(user) = self.users.find_by_id(claims.sub).await? else {
            tracing::info!(user_id = claims.sub, "Refresh rejected: user no longer exists");
            return Err(AuthError::InvalidToken);
        };

        let principal = Principal::try_from(&user)?;
        let tokens = self.issue_tokens(&principal)?;
        Ok((principal, tokens))
    }

    /// Resolve a bearer access token to its principal.
    pub fn validate_bearer_token(&self, token: &str) -> Result<Principal, AuthError> {
        validate_access_token(token, &self.jwt).map(|claims| claims.principal())
    }

    /// Sign in a browser client, creating a server-side session.
    pub async fn sign_in_session(
        &self,
        login: &str,
        password: &str,
    ) -> Result<(Principal, NewSession), AuthError> {
        let principal = self.authenticate(login, password).await?;
        let session = self.sessions.create(principal.user_id).await;
        tracing::info!(user_id = principal.user_id, "Signed in with session");
        Ok((principal, session))
    }

    /// End a session. Always succeeds.
    pub async fn sign_out(&self, session_id: &str) {
        self.sessions.delete(session_id).await;
    }

    /// Resolve a session cookie plus CSRF header to the session's principal.
    ///
    /// The principal is loaded from storage; if the user has since been
    /// removed the session is dropped as well.
    pub async fn validate_session_cookie(
        &self,
        session_id: &str,
        csrf_token: &str,
    ) -> Result<Principal, AuthError> {
        let session = self.sessions.get(session_id).await?;

        let matches: bool = session
            .csrf_token
            .as_bytes()
            .ct_eq(csrf_token.as_bytes())
            .into();
        if !matches {
            tracing::warn!(user_id = session.user_id, "CSRF token mismatch");
            return Err(AuthError::CsrfMismatch);
        }

        let Some(user) = self.users.find_by_id(session.user_id).await? else {
            self.sessions.delete(session_id).await;
            return Err(AuthError::SessionNotFound);
        };

        Principal::try_from(&user)
    }

    /// Stop background session timers.
    pub async fn shutdown(&self) {
        self.sessions.shutdown().await;
    }
}
