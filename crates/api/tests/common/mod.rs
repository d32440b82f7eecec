#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use credence_api::auth::jwt::JwtConfig;
use credence_api::auth::password::{hash_password_with_cost, HashCost, HashingPool};
use credence_api::auth::service::AuthService;
use credence_api::auth::session::SessionStore;
use credence_api::auth::store::{MemoryUserStore, UserStore};
use credence_api::config::{PasswordConfig, ServerConfig, SessionCookieConfig};
use credence_api::router::build_app_router;
use credence_api::state::AppState;
use credence_core::roles::Role;
use credence_db::models::user::{CreateUser, User};

pub const SESSION_COOKIE: &str = "credence_session";
pub const PASSWORD: &str = "correct-horse-battery";

/// Argon2 parameters cheap enough for tests.
pub fn test_cost() -> HashCost {
    HashCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        session: SessionCookieConfig {
            cookie_name: SESSION_COOKIE.to_string(),
            secure: true,
        },
        password: PasswordConfig {
            min_length: 8,
            hash_concurrency: 2,
            cost: test_cost(),
        },
    }
}

/// Application under test plus handles to its in-memory state.
pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub auth: Arc<AuthService>,
}

impl TestApp {
    /// A fresh router for a single `oneshot` request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Insert a user directly into the store with [`PASSWORD`].
    pub async fn seed_user(&self, username: &str, role: Role) -> User {
        let password_hash =
            hash_password_with_cost(PASSWORD, &test_cost()).expect("hashing should succeed");
        self.users
            .create(&CreateUser {
                username: username.to_string(),
                email: format!("{username}@test.com"),
                password_hash,
                role: role.as_str().to_string(),
            })
            .await
            .expect("user creation should succeed")
    }
}

/// Build the full application router over an in-memory user store.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let users = Arc::new(MemoryUserStore::new());
    let auth = Arc::new(AuthService::new(
        users.clone(),
        config.jwt.clone(),
        SessionStore::new(),
        HashingPool::new(config.password.hash_concurrency, config.password.cost)
            .expect("test hash cost should be valid"),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        auth: Arc::clone(&auth),
    };

    TestApp {
        router: build_app_router(state, &config),
        users,
        auth,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should not fail")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// GET with a session cookie and, optionally, a CSRF header.
pub async fn get_session(
    app: Router,
    uri: &str,
    session_id: &str,
    csrf: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(COOKIE, format!("{SESSION_COOKIE}={session_id}"));
    if let Some(csrf) = csrf {
        builder = builder.header("x-csrf-token", csrf);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Extract the session id from a `Set-Cookie` response header.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix(&format!("{SESSION_COOKIE}=")).map(str::to_string))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}
