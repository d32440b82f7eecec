//! Reversible encryption of short secrets.
//!
//! - [`padding`] -- PKCS#7 block padding.
//! - [`cipher`] -- AES-CFB envelope encoding with a random IV.
//! - [`credentials`] -- username/password pair helpers used by the bootstrap flow.

pub mod cipher;
pub mod credentials;
pub mod padding;
