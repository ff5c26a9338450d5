//! Authentication API tests
//!
//! Register, verify, login, me and logout flows over the full router.

mod helpers;

use axum::http::StatusCode;
use helpers::{read_json, TestApp};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn register_creates_a_profile_with_plan_association() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "email": "nova-frota@example.com",
                "password": "secret123",
                "first_name": "Nova",
                "last_name": "Frota",
                "user_type": "client",
                "plan_id": "plan-basic",
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["profile"]["user_type"], "client");
    assert_eq!(body["profile"]["plan_id"], "plan-basic");
    assert_eq!(body["confirmation_required"], true);
}

#[tokio::test]
async fn unconfirmed_accounts_cannot_sign_in() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "email": "pending@example.com",
                "password": "secret123",
                "first_name": "Pending",
                "last_name": "User",
                "user_type": "client",
                "plan_id": null,
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({
                "email": "pending@example.com",
                "password": "secret123",
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json(response).await;
    assert_eq!(body["error"], "unconfirmed_account");
}

#[tokio::test]
async fn a_wrong_verification_code_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/auth/verify",
            &json!({
                "email": "nobody@example.com",
                "code": "000000",
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "invalid_verification_code");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::spawn().await;
    let registration = json!({
        "email": "dup@example.com",
        "password": "secret123",
        "first_name": "Du",
        "last_name": "Plicate",
        "user_type": "provider",
        "plan_id": null,
    });

    let first = app.post_json("/api/auth/register", &registration).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.post_json("/api/auth/register", &registration).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = read_json(second).await;
    assert_eq!(body["error"], "account_exists");
}

#[tokio::test]
async fn login_returns_a_token_and_profile() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({
                "email": "frotista@imovan.dev",
                "password": "imovan123",
                "remember_me": true,
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["access_token"].as_str().is_some());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["profile"]["user_type"], "client");
}

#[tokio::test]
async fn invalid_credentials_are_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({
                "email": "frotista@imovan.dev",
                "password": "wrong-password",
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn me_reflects_the_signed_in_role() {
    let app = TestApp::spawn().await;
    let token = app.login("provider@imovan.dev", false).await;

    let response = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["is_provider"], true);
    assert_eq!(body["is_frotista"], false);
    assert_eq!(body["profile"]["user_type"], "provider");
}

#[tokio::test]
async fn me_without_a_session_redirects_to_login() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("/login?redirect="));
}

#[tokio::test]
async fn logout_invalidates_the_token_and_is_repeatable() {
    let app = TestApp::spawn().await;
    let token = app.login("frotista@imovan.dev", true).await;

    let response = app
        .app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header("authorization", format!("Bearer {}", token))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["redirect_to"], "/login");

    // The token no longer authenticates.
    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.status(), StatusCode::TEMPORARY_REDIRECT);

    // Logging out again is a harmless no-op.
    let again = app
        .app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header("authorization", format!("Bearer {}", token))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
async fn profile_update_round_trips_through_the_backend() {
    let app = TestApp::spawn().await;
    let token = app.login("frotista@imovan.dev", false).await;

    let response = app
        .app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("PATCH")
                .uri("/api/profile")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {}", token))
                .body(axum::body::Body::from(
                    json!({ "first_name": "Renamed" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["first_name"], "Renamed");

    let me = app.get("/api/auth/me", Some(&token)).await;
    let body = read_json(me).await;
    assert_eq!(body["profile"]["first_name"], "Renamed");
}

#[tokio::test]
async fn profile_update_without_a_session_fails_loudly() {
    let app = TestApp::spawn().await;

    let response = app
        .app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("PATCH")
                .uri("/api/profile")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(
                    json!({ "first_name": "Ghost" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["error"], "session_required");
}

#[tokio::test]
async fn health_reports_restore_completion() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["session_restore_complete"], true);
}
