//! Credential bootstrap tool.
//!
//! `bootstrap` generates a fresh key and encrypts a database credential pair
//! under it. `decode` checks an existing configuration by decrypting the
//! envelopes with the key from the environment.

use anyhow::Context;
use clap::{Parser, Subcommand};
use credence_core::crypto::cipher::SymmetricKey;
use credence_core::crypto::credentials::{
    decode_credential_pair, encode_credential_pair, generate_key, Credentials,
    EncodedCredentials,
};
use credence_db::credentials::{key_from_env, KEY_VAR, PASSWORD_ENC_VAR, USER_ENC_VAR};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "credence-cli")]
#[command(version, about = "Encrypt and verify database credentials", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key and encrypt a username/password pair under it
    Bootstrap {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,
    },

    /// Decrypt an encrypted pair with the key from DATABASE_CREDENTIALS_KEY
    Decode {
        #[arg(long, env = USER_ENC_VAR)]
        username_enc: String,

        #[arg(long, env = PASSWORD_ENC_VAR, hide_env_values = true)]
        password_enc: String,

        /// Print the decrypted password instead of its length
        #[arg(long)]
        show_password: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Captured before .env is loaded so the key is never taken from the file.
    let key = key_from_env();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credence_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bootstrap { username, password } => {
            let key = generate_key();
            let encoded = encode_credential_pair(&username, &password, &key);
            tracing::info!(key_bits = key.bits(), "Generated credentials key");

            print!("{}", bootstrap_output(&key, &encoded));

            tracing::info!(
                "Store {KEY_VAR} in the deployment secret store, not alongside the envelopes"
            );
        }
        Commands::Decode {
            username_enc,
            password_enc,
            show_password,
        } => {
            let key = key.with_context(|| format!("{KEY_VAR} is not usable"))?;
            let encoded = EncodedCredentials {
                username: username_enc,
                password: password_enc,
            };
            let credentials = decode_credential_pair(&encoded, &key)
                .context("Failed to decode credentials (wrong key or corrupt envelope)")?;

            print!("{}", decode_output(&credentials, show_password));
        }
    }

    Ok(())
}

/// Env-file lines printed by `bootstrap`.
fn bootstrap_output(key: &SymmetricKey, encoded: &EncodedCredentials) -> String {
    format!(
        "{KEY_VAR}={}\n{USER_ENC_VAR}={}\n{PASSWORD_ENC_VAR}={}\n",
        key.to_base64(),
        encoded.username,
        encoded.password
    )
}

/// Lines printed by `decode`. The password is only shown on request.
fn decode_output(credentials: &Credentials, show_password: bool) -> String {
    let password = if show_password {
        credentials.password.clone()
    } else {
        format!(
            "<{} chars, pass --show-password to print>",
            credentials.password.chars().count()
        )
    };
    format!("username: {}\npassword: {password}\n", credentials.username)
}
