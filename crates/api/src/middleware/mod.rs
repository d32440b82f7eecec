//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`auth::SessionUser`] -- Extracts the user from a session cookie plus CSRF header.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role or above.
//! - [`rbac::RequireModerator`] -- Requires the `moderator` role or above.

pub mod auth;
pub mod rbac;
