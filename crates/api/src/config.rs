use crate::auth::jwt::JwtConfig;
use crate::auth::password::HashCost;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secrets, expiry durations).
    pub jwt: JwtConfig,
    pub session: SessionCookieConfig,
    pub password: PasswordConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    ///
    /// See [`JwtConfig::from_env`], [`SessionCookieConfig::from_env`] and
    /// [`PasswordConfig::from_env`] for the nested sections.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            session: SessionCookieConfig::from_env(),
            password: PasswordConfig::from_env(),
        }
    }
}

/// Session cookie attributes.
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub cookie_name: String,
    /// Emit the `Secure` attribute. Disable only for plain-HTTP development.
    pub secure: bool,
}

impl SessionCookieConfig {
    /// | Env Var                 | Default            |
    /// |-------------------------|--------------------|
    /// | `SESSION_COOKIE_NAME`   | `credence_session` |
    /// | `SESSION_COOKIE_SECURE` | `true`             |
    pub fn from_env() -> Self {
        let cookie_name =
            std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "credence_session".into());
        let secure = std::env::var("SESSION_COOKIE_SECURE")
            .map(|v| parse_bool(&v).expect("SESSION_COOKIE_SECURE must be true or false"))
            .unwrap_or(true);
        Self {
            cookie_name,
            secure,
        }
    }
}

/// Password policy and hashing cost.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Minimum length enforced at sign-up.
    pub min_length: usize,
    /// Maximum concurrent hash operations.
    pub hash_concurrency: usize,
    pub cost: HashCost,
}

impl PasswordConfig {
    /// | Env Var                       | Default              |
    /// |-------------------------------|----------------------|
    /// | `PASSWORD_MIN_LENGTH`         | `8`                  |
    /// | `PASSWORD_HASH_CONCURRENCY`   | available CPUs       |
    /// | `PASSWORD_HASH_MEMORY_KIB`    | argon2 default       |
    /// | `PASSWORD_HASH_ITERATIONS`    | argon2 default       |
    /// | `PASSWORD_HASH_PARALLELISM`   | argon2 default       |
    pub fn from_env() -> Self {
        let defaults = HashCost::default();
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            min_length: env_or("PASSWORD_MIN_LENGTH", 8),
            hash_concurrency: env_or("PASSWORD_HASH_CONCURRENCY", cpus),
            cost: HashCost {
                memory_kib: env_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib),
                iterations: env_or("PASSWORD_HASH_ITERATIONS", defaults.iterations),
                parallelism: env_or("PASSWORD_HASH_PARALLELISM", defaults.parallelism),
            },
        }
    }
}

/// Read and parse `name`, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} has an invalid value: {raw:?}")),
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
