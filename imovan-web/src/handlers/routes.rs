//! Route registry handlers
//!
//! The grouped site map and descriptor lookup backed by the static route
//! table.

use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Lookup query parameters
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub path: String,
}

/// The grouped route table, as consumed by navigation UIs
pub async fn site_map(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "groups": state.registry.groups(),
    }))
}

/// Look up one route descriptor by exact path
pub async fn lookup_route(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.registry.get_route_by_path(&params.path) {
        Some(route) => Ok(Json(json!({ "route": route }))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "route_not_found",
                "message": format!("No route registered for path: {}", params.path),
            })),
        )),
    }
}
