//! Credence core primitives.
//!
//! Zero internal dependencies so both the API server and the offline
//! bootstrap tooling can use them.

pub mod crypto;
pub mod error;
pub mod roles;
pub mod types;
