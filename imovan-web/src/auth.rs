//! Authentication extractors
//!
//! Axum extractors enforcing the route guard: handlers declare the
//! audience they serve and the extractor either yields the session or
//! answers with the guard's redirect. Session tokens are read from the
//! `Authorization: Bearer` header first, then the `imovan_session` cookie.

use crate::{error::ApiError, AppState};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
};
use imovan_core::{Session, UserProfile};
use imovan_platform::routes::guard::{evaluate_access, GuardDecision};
use imovan_platform::{RouteAccess, SessionSnapshot};
use serde_json::json;
use tracing::debug;

/// Session cookie name shared with the frontend
pub const SESSION_COOKIE: &str = "imovan_session";

/// An authenticated request, any role
pub struct CurrentUser {
    pub session: Session,
    /// May be absent when the profile fetch failed; role-gated extractors
    /// never see that state
    pub profile: Option<UserProfile>,
}

/// Optional session extractor; never rejects
pub struct OptionalUser(pub SessionSnapshot);

/// Fleet company (client) requests only
pub struct RequireFrotista {
    pub session: Session,
    pub profile: UserProfile,
}

/// Service provider requests only
pub struct RequireProvider {
    pub session: Session,
    pub profile: UserProfile,
}

/// Integrator administrator requests only
pub struct RequireIntegrator {
    pub session: Session,
    pub profile: UserProfile,
}

/// Extract the bearer token, rejecting with a typed error when absent
pub fn require_token(headers: &HeaderMap) -> Result<String, ApiError> {
    extract_token(headers)
        .ok_or_else(|| ApiError::from(imovan_platform::AuthError::SessionRequired))
}

/// Extract the bearer token from headers or the session cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    let cookies = headers.get("cookie").and_then(|v| v.to_str().ok())?;
    for pair in cookies.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(SESSION_COOKIE) {
            return parts.next().map(|value| value.to_string());
        }
    }

    None
}

/// Turn a non-granting guard decision into its HTTP response
pub fn guard_decision_response(decision: &GuardDecision) -> Response {
    match decision {
        GuardDecision::Loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "session_loading",
                "message": "Session state is still being restored, retry shortly",
            })),
        )
            .into_response(),
        GuardDecision::ProfilePending => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "profile_pending",
                "message": "Profile is still loading, retry shortly",
            })),
        )
            .into_response(),
        GuardDecision::RedirectToLogin { return_to } => {
            debug!("Redirecting unauthenticated request to login: {}", return_to);
            Redirect::temporary(&format!(
                "/login?redirect={}&notice=sign-in-required",
                urlencoding::encode(return_to)
            ))
            .into_response()
        }
        GuardDecision::RedirectToLanding { destination } => {
            debug!("Redirecting role mismatch to {}", destination);
            Redirect::temporary(&format!("{}?notice=role-mismatch", destination)).into_response()
        }
        GuardDecision::Granted => StatusCode::OK.into_response(),
    }
}

/// Resolve the snapshot for this request and apply the guard
async fn authorize(
    parts: &mut Parts,
    app_state: &AppState,
    user_type: Option<RouteAccess>,
) -> Result<SessionSnapshot, Response> {
    let requested_path = parts.uri.path().to_string();

    let snapshot = match extract_token(&parts.headers) {
        Some(token) => app_state
            .sessions
            .authenticate(&token)
            .await
            .map_err(|e| ApiError::from(e).into_response())?,
        None if app_state.sessions.is_initialized() => SessionSnapshot::unauthenticated(),
        None => SessionSnapshot::loading(),
    };

    match evaluate_access(&snapshot, true, user_type, &requested_path) {
        GuardDecision::Granted => Ok(snapshot),
        decision => Err(guard_decision_response(&decision)),
    }
}

/// Split a granted snapshot into its parts
fn into_session_and_profile(
    snapshot: SessionSnapshot,
) -> Result<(Session, Option<UserProfile>), Response> {
    match snapshot.session {
        Some(session) => Ok((session, snapshot.profile)),
        // A granted snapshot always carries a session; this is a guard bug
        // if it ever fires.
        None => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "Granted snapshot without a session",
            })),
        )
            .into_response()),
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let snapshot = authorize(parts, &app_state, Some(RouteAccess::Any)).await?;
        let (session, profile) = into_session_and_profile(snapshot)?;

        Ok(CurrentUser { session, profile })
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let snapshot = match extract_token(&parts.headers) {
            Some(token) => app_state
                .sessions
                .authenticate(&token)
                .await
                .map_err(|e| ApiError::from(e).into_response())?,
            None if app_state.sessions.is_initialized() => SessionSnapshot::unauthenticated(),
            None => SessionSnapshot::loading(),
        };

        Ok(OptionalUser(snapshot))
    }
}

/// Role extractor body shared by the three audience types
async fn require_role(
    parts: &mut Parts,
    state_ref: &AppState,
    access: RouteAccess,
) -> Result<(Session, UserProfile), Response> {
    let snapshot = authorize(parts, state_ref, Some(access)).await?;
    let (session, profile) = into_session_and_profile(snapshot)?;

    match profile {
        Some(profile) => Ok((session, profile)),
        // Role-gated grants require a profile; the guard returns
        // ProfilePending before this can happen.
        None => Err(guard_decision_response(&GuardDecision::ProfilePending)),
    }
}

impl<S> FromRequestParts<S> for RequireFrotista
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let (session, profile) = require_role(parts, &app_state, RouteAccess::Client).await?;
        Ok(RequireFrotista { session, profile })
    }
}

impl<S> FromRequestParts<S> for RequireProvider
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let (session, profile) = require_role(parts, &app_state, RouteAccess::Provider).await?;
        Ok(RequireProvider { session, profile })
    }
}

impl<S> FromRequestParts<S> for RequireIntegrator
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let (session, profile) = require_role(parts, &app_state, RouteAccess::Integrator).await?;
        Ok(RequireIntegrator { session, profile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_tokens_win_over_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer header-token"),
        );
        headers.insert(
            "cookie",
            HeaderValue::from_static("imovan_session=cookie-token"),
        );

        assert_eq!(extract_token(&headers).as_deref(), Some("header-token"));
    }

    #[test]
    fn session_cookie_is_parsed_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; imovan_session=cookie-token; lang=pt"),
        );

        assert_eq!(extract_token(&headers).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn missing_credentials_yield_no_token() {
        let headers = HeaderMap::new();
        assert!(extract_token(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_token(&headers).is_none());
    }

    #[test]
    fn login_redirects_keep_the_destination() {
        let response = guard_decision_response(&GuardDecision::RedirectToLogin {
            return_to: "/fleet-dashboard".to_string(),
        });

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers().get("location").unwrap().to_str().unwrap();
        assert!(location.starts_with("/login?redirect=%2Ffleet-dashboard"));
    }

    #[test]
    fn landing_redirects_carry_a_notice() {
        let response = guard_decision_response(&GuardDecision::RedirectToLanding {
            destination: "/provider/dashboard".to_string(),
        });

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers().get("location").unwrap().to_str().unwrap();
        assert_eq!(location, "/provider/dashboard?notice=role-mismatch");
    }
}
