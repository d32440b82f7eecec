//! Argon2id password hashing, verification, and strength validation.
//!
//! All password hashes use the Argon2id variant with a cryptographically random
//! salt generated via [`OsRng`]. The PHC string format is used for storage so
//! that algorithm parameters and salt are embedded in the hash itself, and
//! verification always uses the parameters recorded in the hash.
//!
//! Hashing is deliberately slow. Request handlers go through [`HashingPool`],
//! which runs the work on the blocking thread pool behind a semaphore so a
//! burst of logins cannot starve unrelated requests.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::AuthError;

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory size in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashCost {
    fn argon2(&self) -> Result<Argon2<'static>, argon2::Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a plaintext password using Argon2id with default cost and a random salt.
///
/// Returns the PHC-formatted hash string (includes algorithm, params, salt, and hash).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    hash_password_with_cost(password, &HashCost::default())
}

/// Hash a plaintext password using Argon2id with explicit cost parameters.
pub fn hash_password_with_cost(
    password: &str,
    cost: &HashCost,
) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = cost.argon2()?;
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted hash.
///
/// Fails closed: a malformed or unsupported hash verifies as `false`.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => verify_parsed(password, &parsed),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

fn verify_parsed(password: &str, parsed_hash: &PasswordHash<'_>) -> bool {
    match Argon2::default().verify_password(password.as_bytes(), parsed_hash) {
        Ok(()) => true,
        Err(argon2::password_hash::Error::Password) => false,
        Err(e) => {
            tracing::warn!(error = %e, "Password verification failed unexpectedly");
            false
        }
    }
}

/// Like [`verify_password`], but a malformed stored hash still costs one
/// verification against `dummy_hash`.
fn verify_or_burn(password: &str, hash: &str, dummy_hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => verify_parsed(password, &parsed),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            if let Ok(dummy) = PasswordHash::new(dummy_hash) {
                let _ = verify_parsed(password, &dummy);
            }
            false
        }
    }
}

/// Validate that a password meets minimum strength requirements.
///
/// Currently enforces a minimum character length. Returns `Ok(())` when the
/// password is acceptable, or `Err` with a human-readable explanation.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), String> {
    if password.chars().count() < min_length {
        return Err(format!(
            "Password must be at least {min_length} characters long"
        ));
    }
    Ok(())
}

/// Plaintext hashed once per pool and verified against when a login names no
/// known user, so both rejection paths cost the same.
const DUMMY_PASSWORD: &str = "credence-timing-equalizer";

/// Bounded pool for CPU-heavy hashing work.
///
/// Each blocking task owns its semaphore permit, so abandoning the awaiting
/// future does not free a slot while Argon2 is still running.
pub struct HashingPool {
    permits: Arc<Semaphore>,
    cost: HashCost,
    dummy_hash: Arc<str>,
}

impl HashingPool {
    /// Create a pool allowing at most `concurrency` hash operations at once.
    ///
    /// Hashes the dummy password up front; fails if `cost` is not a valid
    /// Argon2 parameter set.
    pub fn new(concurrency: usize, cost: HashCost) -> Result<Self, AuthError> {
        let dummy_hash = hash_password_with_cost(DUMMY_PASSWORD, &cost)
            .map_err(|e| AuthError::Internal(format!("invalid hash cost: {e}")))?;

        Ok(Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            cost,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Hash `password` on the blocking pool.
    pub async fn hash(&self, password: String) -> Result<String, AuthError> {
        let permit = self.acquire().await?;
        let cost = self.cost;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            hash_password_with_cost(&password, &cost)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AuthError::Internal(format!("password hashing error: {e}")))
    }

    /// Verify `password` against `hash` on the blocking pool. Fails closed.
    pub async fn verify(&self, password: String, hash: String) -> bool {
        let Ok(permit) = self.acquire().await else {
            return false;
        };
        let dummy_hash = Arc::clone(&self.dummy_hash);
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            verify_or_burn(&password, &hash, &dummy_hash)
        });
        match task.await {
            Ok(verified) => verified,
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }

    /// Burn one verification's worth of work and return `false`.
    ///
    /// Used when the login identifier matched no user.
    pub async fn verify_dummy(&self, password: String) -> bool {
        let _ = self.verify(password, self.dummy_hash.to_string()).await;
        false
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, AuthError> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| AuthError::Internal("hashing pool closed".into()))
    }
}
