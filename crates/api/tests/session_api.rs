//! HTTP-level integration tests for cookie sessions and CSRF enforcement.

mod common;

use axum::body::Body;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use common::{
    body_json, build_test_app, get_session, post_json, send, session_cookie, PASSWORD,
    SESSION_COOKIE,
};
use credence_core::roles::Role;
use serde_json::json;

/// Sign in via `/auth/session` and return `(session_id, csrf_token)`.
async fn sign_in(app: &common::TestApp, login: &str) -> (String, String) {
    let body = json!({ "login": login, "password": PASSWORD });
    let response = post_json(app.app(), "/api/v1/auth/session", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let session_id = session_cookie(&response).expect("session cookie should be set");
    let json = body_json(response).await;
    let csrf = json["csrf_token"].as_str().unwrap().to_string();
    (session_id, csrf)
}

#[tokio::test]
async fn sign_in_sets_hardened_cookie() {
    let app = build_test_app();
    app.seed_user("browser", Role::User).await;

    let body = json!({ "login": "browser", "password": PASSWORD });
    let response = post_json(app.app(), "/api/v1/auth/session", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Max-Age=86400"));

    let json = body_json(response).await;
    assert_eq!(json["user"]["username"], "browser");
    assert_eq!(json["csrf_token"].as_str().unwrap().len(), 43);
}

#[tokio::test]
async fn session_me_with_matching_csrf() {
    let app = build_test_app();
    let user = app.seed_user("reader", Role::User).await;
    let (session_id, csrf) = sign_in(&app, "reader").await;

    let response = get_session(app.app(), "/api/v1/auth/session/me", &session_id, Some(&csrf)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], user.id);
}

#[tokio::test]
async fn csrf_mismatch_returns_403() {
    let app = build_test_app();
    app.seed_user("forger", Role::User).await;
    let (session_id, _csrf) = sign_in(&app, "forger").await;

    let response = get_session(
        app.app(),
        "/api/v1/auth/session/me",
        &session_id,
        Some("not-the-token"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "CSRF_MISMATCH");

    let response = get_session(app.app(), "/api/v1/auth/session/me", &session_id, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_session_returns_401() {
    let app = build_test_app();

    let response =
        get_session(app.app(), "/api/v1/auth/session/me", "no-such-session", Some("x")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn logout_deletes_session_and_clears_cookie() {
    let app = build_test_app();
    app.seed_user("leaver", Role::User).await;
    let (session_id, csrf) = sign_in(&app, "leaver").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/session/logout")
        .header(COOKIE, format!("{SESSION_COOKIE}={session_id}"))
        .body(Body::empty())
        .unwrap();
    let response = send(app.app(), request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let response = get_session(app.app(), "/api/v1/auth/session/me", &session_id, Some(&csrf)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.auth.sessions().is_empty().await);
}

#[tokio::test]
async fn logout_without_session_still_succeeds() {
    let app = build_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/session/logout")
        .body(Body::empty())
        .unwrap();
    let response = send(app.app(), request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn session_cookie_is_not_a_bearer_token() {
    let app = build_test_app();
    app.seed_user("crossover", Role::User).await;
    let (session_id, _csrf) = sign_in(&app, "crossover").await;

    let response = common::get_auth(app.app(), "/api/v1/auth/me", &session_id).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
