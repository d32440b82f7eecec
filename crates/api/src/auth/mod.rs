//! Authentication and credential primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- Access/refresh token issuance and validation.
//! - [`session`] -- In-memory session store with CSRF tokens and fixed TTL.
//! - [`store`] -- The [`store::UserStore`] seam over user persistence.
//! - [`service`] -- [`service::AuthService`], composing the pieces above.

pub mod error;
pub mod jwt;
pub mod password;
pub mod principal;
pub mod service;
pub mod session;
pub mod store;

pub use error::AuthError;
pub use principal::Principal;
