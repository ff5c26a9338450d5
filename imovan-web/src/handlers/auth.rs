//! Authentication handlers for registration, login and session management

use crate::{
    auth::{extract_token, CurrentUser},
    error::ApiError,
    AppState,
};
use axum::{extract::State, http::HeaderMap, response::Json};
use chrono::{DateTime, Utc};
use imovan_core::UserProfile;
use imovan_platform::Registration;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Extended retention ("remember me"); defaults to the short window
    #[serde(default)]
    pub remember_me: bool,
}

/// Account verification request body
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Retention deadline of the persisted session record
    pub expires_at: DateTime<Utc>,
    /// Absent when the profile fetch failed; `/api/profile/refresh` retries
    pub profile: Option<UserProfile>,
}

/// User registration endpoint
///
/// Creates the account with profile metadata embedded and associates the
/// plan in a second step. Returns whether email confirmation is still
/// pending.
pub async fn register_user(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> Result<Json<Value>, ApiError> {
    info!("Registration attempt: {}", registration.email);

    let registered = state.sessions.register(registration).await?;

    info!("User registered successfully: {}", registered.profile.id);
    Ok(Json(json!({
        "profile": registered.profile,
        "confirmation_required": registered.confirmation_required,
    })))
}

/// Account verification endpoint
///
/// Confirms a pending account with the emailed code.
pub async fn verify_account(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .sessions
        .confirm_account(&request.email, &request.code)
        .await?;

    info!("Account confirmed: {}", request.email);
    Ok(Json(json!({
        "message": "Account confirmed, you can sign in now",
    })))
}

/// User login endpoint
///
/// Password grant against the identity backend. The session is persisted
/// into the durable tier when `remember_me` is set, the ephemeral tier
/// otherwise. Navigation after login belongs to the client.
pub async fn login_user(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    info!("Login attempt: {}", request.email);

    let outcome = state
        .sessions
        .login(&request.email, &request.password, request.remember_me)
        .await?;

    Ok(Json(LoginResponse {
        access_token: outcome.session.access_token,
        token_type: "Bearer".to_string(),
        expires_at: outcome.record_expires_at,
        profile: outcome.profile,
    }))
}

/// Logout endpoint
///
/// Ends the session and points the client at the login route. Safe to call
/// repeatedly; a second call is a no-op.
pub async fn logout_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    if let Some(token) = extract_token(&headers) {
        state.sessions.logout(&token).await?;
    }

    Ok(Json(json!({
        "message": "Logged out successfully",
        "redirect_to": "/login",
    })))
}

/// Current session information
pub async fn get_current_user(user: CurrentUser) -> Json<Value> {
    Json(json!({
        "user_id": user.session.user_id,
        "profile": user.profile,
        "is_frotista": matches!(
            user.profile.as_ref().map(|p| p.user_type),
            Some(imovan_core::UserType::Client)
        ),
        "is_provider": matches!(
            user.profile.as_ref().map(|p| p.user_type),
            Some(imovan_core::UserType::Provider)
        ),
        "is_integrator": matches!(
            user.profile.as_ref().map(|p| p.user_type),
            Some(imovan_core::UserType::Integrator)
        ),
    }))
}