//! Symmetric credential cipher.
//!
//! Envelope format: `base64url(IV || AES-CFB(key, IV, pkcs7(plaintext)))`.
//! The IV is one AES block of fresh randomness per call and is not secret.
//!
//! No integrity tag is applied. A wrong key and a tampered envelope are
//! indistinguishable and both surface as
//! [`CipherError::InvalidKeyOrCorruptData`]; a bit flip can also decode to
//! different plaintext without any error. Adding a MAC would change the
//! envelope format already stored in deployed configuration.

use std::fmt;

use aes::{Aes128, Aes192, Aes256};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::RngCore;

use super::padding;

/// AES block size in bytes; also the IV length.
pub const BLOCK_SIZE: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("symmetric key must be 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("envelope is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("envelope is {len} bytes, shorter than one block")]
    EnvelopeTooShort { len: usize },

    #[error("invalid key or corrupt data")]
    InvalidKeyOrCorruptData,
}

#[derive(Clone, PartialEq, Eq)]
enum KeyMaterial {
    Aes128([u8; 16]),
    Aes192([u8; 24]),
    Aes256([u8; 32]),
}

/// A 128, 192 or 256-bit AES key supplied by the caller.
///
/// `Debug` never prints the key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey(KeyMaterial);

impl SymmetricKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        let material = match bytes.len() {
            16 => KeyMaterial::Aes128(copy_array(bytes)),
            24 => KeyMaterial::Aes192(copy_array(bytes)),
            32 => KeyMaterial::Aes256(copy_array(bytes)),
            other => return Err(CipherError::InvalidKeyLength(other)),
        };
        Ok(Self(material))
    }

    /// Parse a key from its URL-safe base64 text form.
    pub fn from_base64(text: &str) -> Result<Self, CipherError> {
        let bytes = URL_SAFE.decode(text.trim())?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            KeyMaterial::Aes128(k) => k,
            KeyMaterial::Aes192(k) => k,
            KeyMaterial::Aes256(k) => k,
        }
    }

    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(self.as_bytes())
    }

    /// Key length in bits.
    pub fn bits(&self) -> usize {
        self.as_bytes().len() * 8
    }
}

impl From<[u8; 32]> for SymmetricKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(KeyMaterial::Aes256(bytes))
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey({} bits, [redacted])", self.bits())
    }
}

fn copy_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

/// Encrypt `plaintext` under `key` into a base64url envelope.
///
/// Every call draws a new random IV, so encoding the same plaintext twice
/// yields different envelopes.
pub fn encode(plaintext: &[u8], key: &SymmetricKey) -> String {
    let mut iv = [0u8; BLOCK_SIZE];
    rand::rng().fill_bytes(&mut iv);

    let mut buf = padding::pad(plaintext, BLOCK_SIZE);
    encrypt_in_place(key, &iv, &mut buf);

    let mut raw = Vec::with_capacity(BLOCK_SIZE + buf.len());
    raw.extend_from_slice(&iv);
    raw.extend_from_slice(&buf);
    URL_SAFE.encode(raw)
}

/// Decrypt an envelope produced by [`encode`].
pub fn decode(envelope: &str, key: &SymmetricKey) -> Result<Vec<u8>, CipherError> {
    let raw = URL_SAFE.decode(envelope.trim())?;
    if raw.len() < BLOCK_SIZE {
        return Err(CipherError::EnvelopeTooShort { len: raw.len() });
    }

    let (iv_bytes, ciphertext) = raw.split_at(BLOCK_SIZE);
    let iv: [u8; BLOCK_SIZE] = copy_array(iv_bytes);
    let mut buf = ciphertext.to_vec();
    decrypt_in_place(key, &iv, &mut buf);

    let plaintext =
        padding::unpad(&buf, BLOCK_SIZE).map_err(|_| CipherError::InvalidKeyOrCorruptData)?;
    Ok(plaintext.to_vec())
}

fn encrypt_in_place(key: &SymmetricKey, iv: &[u8; BLOCK_SIZE], buf: &mut [u8]) {
    match &key.0 {
        KeyMaterial::Aes128(k) => cfb_mode::Encryptor::<Aes128>::new(k.into(), iv.into()).encrypt(buf),
        KeyMaterial::Aes192(k) => cfb_mode::Encryptor::<Aes192>::new(k.into(), iv.into()).encrypt(buf),
        KeyMaterial::Aes256(k) => cfb_mode::Encryptor::<Aes256>::new(k.into(), iv.into()).encrypt(buf),
    }
}

fn decrypt_in_place(key: &SymmetricKey, iv: &[u8; BLOCK_SIZE], buf: &mut [u8]) {
    match &key.0 {
        KeyMaterial::Aes128(k) => cfb_mode::Decryptor::<Aes128>::new(k.into(), iv.into()).decrypt(buf),
        KeyMaterial::Aes192(k) => cfb_mode::Decryptor::<Aes192>::new(k.into(), iv.into()).decrypt(buf),
        KeyMaterial::Aes256(k) => cfb_mode::Decryptor::<Aes256>::new(k.into(), iv.into()).decrypt(buf),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn key_256() -> SymmetricKey {
        SymmetricKey::from_bytes(&[7u8; 32]).unwrap()
    }

    #[test]
    fn round_trips_with_every_key_size() {
        for len in [16usize, 24, 32] {
            let key = SymmetricKey::from_bytes(&vec![0x42; len]).unwrap();
            let plaintexts: [&[u8]; 4] =
                [b"", b"a", b"exactly16bytes!!", b"a somewhat longer secret value"];
            for plaintext in plaintexts {
                let envelope = encode(plaintext, &key);
                assert_eq!(decode(&envelope, &key).unwrap(), plaintext);
            }
        }
    }

    #[test]
    fn envelope_is_iv_plus_padded_ciphertext() {
        let envelope = encode(b"s3cret!", &key_256());
        let raw = URL_SAFE.decode(&envelope).unwrap();
        assert_eq!(raw.len(), BLOCK_SIZE * 2);
        assert!(!envelope.contains('+') && !envelope.contains('/'));
    }

    #[test]
    fn fresh_iv_per_call() {
        let key = key_256();
        let a = encode(b"admin", &key);
        let b = encode(b"admin", &key);
        assert_ne!(a, b);
        assert_eq!(decode(&a, &key).unwrap(), decode(&b, &key).unwrap());
    }

    #[test]
    fn rejects_bad_key_length() {
        assert_matches!(
            SymmetricKey::from_bytes(&[0u8; 20]),
            Err(CipherError::InvalidKeyLength(20))
        );
    }

    #[test]
    fn key_base64_round_trip() {
        let key = key_256();
        let parsed = SymmetricKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.bits(), 256);
    }

    #[test]
    fn key_debug_is_redacted() {
        let rendered = format!("{:?}", key_256());
        assert_eq!(rendered, "SymmetricKey(256 bits, [redacted])");
    }

    #[test]
    fn short_envelope_is_rejected() {
        let envelope = URL_SAFE.encode([0u8; BLOCK_SIZE - 1]);
        assert_matches!(
            decode(&envelope, &key_256()),
            Err(CipherError::EnvelopeTooShort { len: 15 })
        );
    }

    #[test]
    fn iv_only_envelope_is_corrupt() {
        let envelope = URL_SAFE.encode([0u8; BLOCK_SIZE]);
        assert_matches!(
            decode(&envelope, &key_256()),
            Err(CipherError::InvalidKeyOrCorruptData)
        );
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert_matches!(
            decode("not base64!!", &key_256()),
            Err(CipherError::InvalidEncoding(_))
        );
    }

    #[test]
    fn bit_flips_never_yield_original_plaintext() {
        let key = key_256();
        let plaintext = b"s3cret!";
        let raw = URL_SAFE.decode(encode(plaintext, &key)).unwrap();

        for byte in 0..raw.len() {
            for bit in 0..8 {
                let mut tampered = raw.clone();
                tampered[byte] ^= 1 << bit;
                match decode(&URL_SAFE.encode(&tampered), &key) {
                    Ok(decoded) => assert_ne!(decoded, plaintext, "byte {byte} bit {bit}"),
                    Err(err) => assert_matches!(err, CipherError::InvalidKeyOrCorruptData),
                }
            }
        }
    }

    #[test]
    fn wrong_key_does_not_recover_plaintext() {
        let envelope = encode(b"s3cret!", &key_256());
        let other = SymmetricKey::from_bytes(&[8u8; 32]).unwrap();
        match decode(&envelope, &other) {
            Ok(decoded) => assert_ne!(decoded, b"s3cret!"),
            Err(err) => assert_matches!(err, CipherError::InvalidKeyOrCorruptData),
        }
    }
}
