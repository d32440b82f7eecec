/// Authentication failures surfaced across the subsystem boundary.
///
/// Variants deliberately carry no detail about which check failed; the
/// underlying reason is only logged server-side.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown login or wrong password. The two are never distinguished.
    #[error("Invalid login or password")]
    InvalidCredentials,

    /// Malformed, forged, wrong-algorithm, or expired token.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("CSRF token mismatch")]
    CsrfMismatch,

    /// Unexpected storage or signing failure. The message is logged, never sent.
    #[error("Internal error: {0}")]
    Internal(String),
}
