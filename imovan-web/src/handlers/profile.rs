//! Profile handlers
//!
//! Reads come from the session snapshot; mutations go through the session
//! manager, which fails loudly without a live session.

use crate::{
    auth::{require_token, CurrentUser},
    error::ApiError,
    AppState,
};
use axum::{extract::State, http::HeaderMap, response::Json};
use imovan_core::UserProfile;
use imovan_platform::ProfileChanges;
use serde_json::{json, Value};
use tracing::info;

/// Current profile, as cached for this session
pub async fn get_profile(user: CurrentUser) -> Json<Value> {
    match user.profile {
        Some(profile) => Json(json!({ "profile": profile })),
        None => Json(json!({
            "profile": Value::Null,
            "message": "Profile is not loaded yet, try /api/profile/refresh",
        })),
    }
}

/// Write partial profile fields, then return the refreshed record
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(changes): Json<ProfileChanges>,
) -> Result<Json<UserProfile>, ApiError> {
    let token = require_token(&headers)?;

    let profile = state.sessions.update_profile(&token, &changes).await?;

    info!("Profile updated: {}", profile.id);
    Ok(Json(profile))
}

/// Re-fetch the profile from the backend, replacing the cached copy
pub async fn refresh_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, ApiError> {
    let token = require_token(&headers)?;

    let profile = state.sessions.refresh_profile(&token).await?;
    Ok(Json(profile))
}
