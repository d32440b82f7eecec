//! Username/password pairs encrypted field by field.
//!
//! Each field is an independent [`cipher`](super::cipher) envelope; there is
//! no cross-field binding.

use std::fmt;

use rand::RngCore;

use super::cipher::{self, CipherError, SymmetricKey};

/// Length in bytes of keys produced by [`generate_key`].
pub const GENERATED_KEY_LEN: usize = 32;

/// Cleartext credential pair. `Debug` hides the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// The two envelopes for a credential pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCredentials {
    pub username: String,
    pub password: String,
}

/// Generate a fresh random 256-bit key for the bootstrap flow.
pub fn generate_key() -> SymmetricKey {
    let mut bytes = [0u8; GENERATED_KEY_LEN];
    rand::rng().fill_bytes(&mut bytes);
    SymmetricKey::from(bytes)
}

pub fn encode_credential_pair(
    username: &str,
    password: &str,
    key: &SymmetricKey,
) -> EncodedCredentials {
    EncodedCredentials {
        username: cipher::encode(username.as_bytes(), key),
        password: cipher::encode(password.as_bytes(), key),
    }
}

/// Decode both envelopes. Non-UTF-8 plaintext counts as corrupt data.
pub fn decode_credential_pair(
    encoded: &EncodedCredentials,
    key: &SymmetricKey,
) -> Result<Credentials, CipherError> {
    Ok(Credentials {
        username: decode_text(&encoded.username, key)?,
        password: decode_text(&encoded.password, key)?,
    })
}

fn decode_text(envelope: &str, key: &SymmetricKey) -> Result<String, CipherError> {
    let bytes = cipher::decode(envelope, key)?;
    String::from_utf8(bytes).map_err(|_| CipherError::InvalidKeyOrCorruptData)
}
