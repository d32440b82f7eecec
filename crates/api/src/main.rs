use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credence_api::auth::password::HashingPool;
use credence_api::auth::service::AuthService;
use credence_api::auth::session::SessionStore;
use credence_api::auth::store::PgUserStore;
use credence_api::config::ServerConfig;
use credence_api::router::build_app_router;
use credence_api::state::AppState;
use credence_db::credentials::{key_from_env, DatabaseConfig};

#[tokio::main]
async fn main() {
    // The credentials key must come from the real environment, never from
    // the .env file that holds the encrypted envelopes.
    let credentials_key = key_from_env();

    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credence_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let credentials_key =
        credentials_key.unwrap_or_else(|e| panic!("Database credentials key unavailable: {e}"));
    let db_config =
        DatabaseConfig::from_env().unwrap_or_else(|e| panic!("Invalid database config: {e}"));
    let connect_options = db_config
        .connect_options(&credentials_key)
        .unwrap_or_else(|e| panic!("Failed to decode database credentials: {e}"));
    drop(credentials_key);

    let pool = credence_db::create_pool(connect_options)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    credence_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    credence_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Auth ---
    let hashing = HashingPool::new(config.password.hash_concurrency, config.password.cost)
        .unwrap_or_else(|e| panic!("Invalid password hashing config: {e}"));
    let auth = Arc::new(AuthService::new(
        Arc::new(PgUserStore::new(pool.clone())),
        config.jwt.clone(),
        SessionStore::new(),
        hashing,
    ));
    tracing::info!(
        hash_concurrency = config.password.hash_concurrency,
        "Auth service ready"
    );

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        auth: Arc::clone(&auth),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    auth.shutdown().await;
    tracing::info!("Session store cleared");

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
