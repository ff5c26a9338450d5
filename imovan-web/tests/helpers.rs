//! Integration test helpers
//!
//! Builds the full router over a temporary durable tier and the local
//! development backend, then drives it in-process with oneshot requests.

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use imovan_web::{create_app, AppState, WebConfig};
use serde_json::Value;
use tower::ServiceExt;

/// A router plus the temporary directory backing its durable tier
pub struct TestApp {
    pub app: Router,
    _session_dir: tempfile::TempDir,
}

impl TestApp {
    /// Spawn an application in development mode (local backend, demo
    /// accounts seeded)
    pub async fn spawn() -> Self {
        let session_dir = tempfile::tempdir().expect("create temp session dir");

        let config = WebConfig {
            dev_mode: true,
            session_dir: Some(session_dir.path().to_path_buf()),
            ..WebConfig::default()
        };

        let state = AppState::new(config).await.expect("build app state");

        Self {
            app: create_app(state),
            _session_dir: session_dir,
        }
    }

    /// Send a JSON POST
    pub async fn post_json(&self, uri: &str, body: &Value) -> Response<Body> {
        self.app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Send a GET, optionally with a bearer token
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        self.app
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Log a demo account in and return its access token
    pub async fn login(&self, email: &str, remember_me: bool) -> String {
        let response = self
            .post_json(
                "/api/auth/login",
                &serde_json::json!({
                    "email": email,
                    "password": "imovan123",
                    "remember_me": remember_me,
                }),
            )
            .await;

        assert_eq!(response.status(), 200, "demo login should succeed");
        let body = read_json(response).await;
        body["access_token"]
            .as_str()
            .expect("login response carries a token")
            .to_string()
    }
}

/// Collect a response body as JSON
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}
