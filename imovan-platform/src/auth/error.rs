//! Authentication error taxonomy
//!
//! Typed failures surfaced by identity backends and the session manager.
//! The web layer maps these onto HTTP statuses and stable error codes.

/// Authentication and session errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account pending email confirmation")]
    UnconfirmedAccount,
    #[error("Missing credentials")]
    MissingCredentials,
    #[error("Invalid or expired verification code")]
    InvalidVerificationCode,
    #[error("Account already registered")]
    AccountExists,
    #[error("An active session is required")]
    SessionRequired,
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Whether the user can recover by simply resubmitting corrected input
    pub fn is_recoverable_by_user(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::MissingCredentials
                | AuthError::InvalidVerificationCode
        )
    }
}
