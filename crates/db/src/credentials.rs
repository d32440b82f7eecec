//! Startup half of the credential bootstrap flow.
//!
//! The database username and password live in configuration as encrypted
//! envelopes (see `credence-cli bootstrap`). The key comes from the process
//! environment, supplied by the deployment's secret store. Any failure here is
//! fatal: the server must not start without usable storage credentials.

use credence_core::crypto::cipher::{CipherError, SymmetricKey};
use credence_core::crypto::credentials::{decode_credential_pair, EncodedCredentials};
use sqlx::postgres::PgConnectOptions;

pub const KEY_VAR: &str = "DATABASE_CREDENTIALS_KEY";
pub const USER_ENC_VAR: &str = "DATABASE_USER_ENC";
pub const PASSWORD_ENC_VAR: &str = "DATABASE_PASSWORD_ENC";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_NAME: &str = "credence";

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("{0} must be set")]
    MissingVar(&'static str),

    #[error("DATABASE_PORT must be a valid u16, got {0:?}")]
    InvalidPort(String),

    #[error("{var}: {source}")]
    Cipher {
        var: &'static str,
        #[source]
        source: CipherError,
    },
}

/// Read the credential key from the process environment.
///
/// Call this before loading any `.env` file so a key accidentally committed
/// next to the envelopes is never picked up.
pub fn key_from_env() -> Result<SymmetricKey, BootstrapError> {
    let text = std::env::var(KEY_VAR).map_err(|_| BootstrapError::MissingVar(KEY_VAR))?;
    SymmetricKey::from_base64(&text).map_err(|source| BootstrapError::Cipher {
        var: KEY_VAR,
        source,
    })
}

/// Database target plus the still-encrypted credential pair.
///
/// | Env Var                 | Required | Default     |
/// |-------------------------|----------|-------------|
/// | `DATABASE_HOST`         | no       | `localhost` |
/// | `DATABASE_PORT`         | no       | `5432`      |
/// | `DATABASE_NAME`         | no       | `credence`  |
/// | `DATABASE_USER_ENC`     | **yes**  | --          |
/// | `DATABASE_PASSWORD_ENC` | **yes**  | --          |
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub encoded: EncodedCredentials,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, BootstrapError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BootstrapError> {
        let host = lookup("DATABASE_HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let port = match lookup("DATABASE_PORT") {
            Some(raw) => raw.parse().map_err(|_| BootstrapError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        let name = lookup("DATABASE_NAME").unwrap_or_else(|| DEFAULT_NAME.into());

        let username = lookup(USER_ENC_VAR).ok_or(BootstrapError::MissingVar(USER_ENC_VAR))?;
        let password =
            lookup(PASSWORD_ENC_VAR).ok_or(BootstrapError::MissingVar(PASSWORD_ENC_VAR))?;

        Ok(Self {
            host,
            port,
            name,
            encoded: EncodedCredentials { username, password },
        })
    }

    /// Decrypt the credential pair and build connect options.
    ///
    /// Options are built field by field rather than as a URL so that
    /// characters like `@` or `/` in the password need no escaping.
    pub fn connect_options(&self, key: &SymmetricKey) -> Result<PgConnectOptions, BootstrapError> {
        let credentials = decode_credential_pair(&self.encoded, key).map_err(|source| {
            BootstrapError::Cipher {
                var: "DATABASE_USER_ENC/DATABASE_PASSWORD_ENC",
                source,
            }
        })?;

        tracing::info!(
            host = %self.host,
            port = self.port,
            database = %self.name,
            "Decoded database credentials"
        );

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.name)
            .username(&credentials.username)
            .password(&credentials.password))
    }
}
