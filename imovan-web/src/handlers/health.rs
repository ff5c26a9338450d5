//! Health check handler

use crate::AppState;
use axum::{extract::State, response::Json};
use serde_json::{json, Value};

/// Service health and readiness
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "imovan-web",
        "session_restore_complete": state.sessions.is_initialized(),
    }))
}
