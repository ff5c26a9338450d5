//! Identity backend abstraction
//!
//! The platform treats the hosted identity/data service as an external
//! collaborator behind this trait. Implementations: [`super::HttpAuthBackend`]
//! for the hosted service and [`super::LocalAuthBackend`] for development
//! and tests.

use super::error::AuthError;
use async_trait::async_trait;
use imovan_core::{Session, UserProfile, UserType};
use serde::{Deserialize, Serialize};

/// Password-grant credentials
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Signup request with profile metadata embedded
///
/// The plan association is intentionally not part of the signup payload;
/// it is written in a separate round trip after the account exists.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub plan_id: Option<String>,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.plan_id.is_none()
    }
}

/// Result of a signup call
#[derive(Debug, Clone)]
pub struct RegisteredAccount {
    /// The created profile record
    pub profile: UserProfile,
    /// Whether the account still needs email confirmation before sign-in
    pub confirmation_required: bool,
}

/// Identity backend seam
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a session via the password grant
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Create an account with profile metadata embedded
    async fn sign_up(&self, registration: &Registration) -> Result<RegisteredAccount, AuthError>;

    /// Confirm a pending account with an emailed verification code
    async fn confirm_account(&self, email: &str, code: &str) -> Result<(), AuthError>;

    /// Invalidate a session on the backend side
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Fetch the profile record for a user id
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, AuthError>;

    /// Write partial fields to the profile record
    async fn update_profile(
        &self,
        user_id: &str,
        changes: &ProfileChanges,
    ) -> Result<UserProfile, AuthError>;

    /// Update the plan association on the profile record
    async fn assign_plan(&self, user_id: &str, plan_id: &str) -> Result<(), AuthError>;
}
