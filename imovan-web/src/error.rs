//! API error responses
//!
//! Maps platform errors onto HTTP statuses and stable error codes so
//! clients always receive `{ "error": <code>, "message": <text> }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use imovan_platform::{AuthError, PlatformError};
use serde_json::json;

/// Wrapper turning platform errors into HTTP responses
#[derive(Debug)]
pub struct ApiError(pub PlatformError);

impl From<PlatformError> for ApiError {
    fn from(error: PlatformError) -> Self {
        Self(error)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self(PlatformError::Auth(error))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            PlatformError::Auth(auth) => match auth {
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "invalid_credentials",
                    "Invalid email or password".to_string(),
                ),
                AuthError::UnconfirmedAccount => (
                    StatusCode::FORBIDDEN,
                    "unconfirmed_account",
                    "Account is pending email confirmation".to_string(),
                ),
                AuthError::MissingCredentials => (
                    StatusCode::BAD_REQUEST,
                    "missing_credentials",
                    "Email and password are required".to_string(),
                ),
                AuthError::InvalidVerificationCode => (
                    StatusCode::BAD_REQUEST,
                    "invalid_verification_code",
                    "Invalid or expired verification code".to_string(),
                ),
                AuthError::AccountExists => (
                    StatusCode::CONFLICT,
                    "account_exists",
                    "An account with this email already exists".to_string(),
                ),
                AuthError::SessionRequired => (
                    StatusCode::UNAUTHORIZED,
                    "session_required",
                    "An active session is required".to_string(),
                ),
                AuthError::ProfileNotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "profile_not_found",
                    auth.to_string(),
                ),
                AuthError::Backend(_) => (
                    StatusCode::BAD_GATEWAY,
                    "backend_error",
                    "The identity service is unavailable".to_string(),
                ),
                AuthError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "Session storage failed".to_string(),
                ),
            },
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                other.to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_code,
            "message": message,
        }));

        (status, body).into_response()
    }
}
