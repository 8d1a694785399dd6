//! Auth Tests
//!
//! Covers signup, login, token refresh/rotation, revocation, and /auth/me.

mod common;

use axum::http::StatusCode;
use common::{app, DEFAULT_PASSWORD};
use serde_json::json;

// ===========================================================================
// Signup
// ===========================================================================

#[tokio::test]
async fn signup_creates_user() {
    let app = app().await;

    let resp = app
        .post_json(
            "/users",
            json!({
                "handle": "auth_signup",
                "email": "auth_signup@example.com",
                "display_name": "Signup User",
                "bio": "hello",
                "password": "supersecret123",
            }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["handle"].as_str().unwrap(), "auth_signup");
    assert_eq!(body["email"].as_str().unwrap(), "auth_signup@example.com");
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn signup_duplicate_handle_conflicts() {
    let app = app().await;

    let payload = json!({
        "handle": "auth_dup_handle",
        "email": "auth_dup_handle_1@example.com",
        "display_name": "Dup",
        "password": "supersecret123",
    });
    let resp = app.post_json("/users", payload, None).await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app
        .post_json(
            "/users",
            json!({
                "handle": "auth_dup_handle",
                "email": "auth_dup_handle_2@example.com",
                "display_name": "Dup",
                "password": "supersecret123",
            }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.error_message(), "handle already taken");
}

#[tokio::test]
async fn signup_duplicate_email_conflicts() {
    let app = app().await;

    let resp = app
        .post_json(
            "/users",
            json!({
                "handle": "auth_dup_email_1",
                "email": "auth_dup_email@example.com",
                "display_name": "Dup",
                "password": "supersecret123",
            }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app
        .post_json(
            "/users",
            json!({
                "handle": "auth_dup_email_2",
                "email": "auth_dup_email@example.com",
                "display_name": "Dup",
                "password": "supersecret123",
            }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.error_message(), "email already taken");
}

#[tokio::test]
async fn signup_rejects_short_password() {
    let app = app().await;

    let resp = app
        .post_json(
            "/users",
            json!({
                "handle": "auth_shortpw",
                "email": "auth_shortpw@example.com",
                "display_name": "Short",
                "password": "short",
            }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ===========================================================================
// Login
// ===========================================================================

#[tokio::test]
async fn login_with_email_and_handle() {
    let app = app().await;
    let user = app.create_user("auth_login").await;

    let resp = app
        .post_json(
            "/auth/login",
            json!({ "identifier": user.email, "password": DEFAULT_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json()["access_token"].as_str().is_some());

    let resp = app
        .post_json(
            "/auth/login",
            json!({ "identifier": user.handle, "password": DEFAULT_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json()["refresh_token"].as_str().is_some());
}

#[tokio::test]
async fn login_wrong_password() {
    let app = app().await;
    let user = app.create_user("auth_wrongpw").await;

    let resp = app
        .post_json(
            "/auth/login",
            json!({ "identifier": user.email, "password": "not-the-password" }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid credentials");
}

#[tokio::test]
async fn login_unknown_identifier() {
    let app = app().await;

    let resp = app
        .post_json(
            "/auth/login",
            json!({ "identifier": "auth_nobody@example.com", "password": DEFAULT_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ===========================================================================
// Refresh rotation + revocation
// ===========================================================================

#[tokio::test]
async fn refresh_rotates_token() {
    let app = app().await;
    let user = app.create_user("auth_refresh").await;

    let resp = app
        .post_json(
            "/auth/refresh",
            json!({ "refresh_token": user.refresh_token }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let new_refresh = body["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, user.refresh_token);

    // The old refresh token is spent after rotation.
    let resp = app
        .post_json(
            "/auth/refresh",
            json!({ "refresh_token": user.refresh_token }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    // The rotated token still works.
    let resp = app
        .post_json("/auth/refresh", json!({ "refresh_token": new_refresh }), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn revoke_refresh_token() {
    let app = app().await;
    let user = app.create_user("auth_revoke").await;

    let resp = app
        .post_json(
            "/auth/revoke",
            json!({ "refresh_token": user.refresh_token }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .post_json(
            "/auth/refresh",
            json!({ "refresh_token": user.refresh_token }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ===========================================================================
// /auth/me + token validation
// ===========================================================================

#[tokio::test]
async fn me_returns_current_user() {
    let app = app().await;
    let user = app.create_user("auth_me").await;

    let resp = app.get("/auth/me", Some(&user.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["id"].as_str().unwrap(), user.id.to_string());
    assert_eq!(body["handle"].as_str().unwrap(), user.handle);
}

#[tokio::test]
async fn me_rejects_missing_and_garbage_tokens() {
    let app = app().await;

    let resp = app.get("/auth/me", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.get("/auth/me", Some("not-a-real-token")).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
