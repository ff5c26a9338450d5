//! Hosted identity/data service client
//!
//! Talks to the hosted backend's REST surface: password grant, signup,
//! verification, sign-out, and the `user_profiles` table. Failures are
//! classified into the platform error taxonomy before they reach callers.

use super::backend::{
    AuthBackend, Credentials, ProfileChanges, RegisteredAccount, Registration,
};
use super::error::AuthError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use imovan_core::{BackendConfig, Session, UserProfile};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

/// Table holding application profiles on the data service
const PROFILES_TABLE: &str = "user_profiles";

/// REST client for the hosted identity/data service
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Password-grant response
#[derive(Debug, Deserialize)]
struct TokenGrantResponse {
    access_token: String,
    expires_in: i64,
    user: BackendUser,
}

/// Identity record embedded in auth responses
#[derive(Debug, Deserialize)]
struct BackendUser {
    id: String,
}

/// Signup response
#[derive(Debug, Deserialize)]
struct SignupResponse {
    user: Option<BackendUser>,
    id: Option<String>,
}

/// Error body shape used by the hosted service
#[derive(Debug, Default, Deserialize)]
struct BackendErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl BackendErrorBody {
    fn description(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
    }
}

impl HttpAuthBackend {
    /// Create a new client from backend configuration
    pub fn new(config: &BackendConfig) -> Result<Self, AuthError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| AuthError::Backend("backend base URL is not configured".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AuthError::Backend(format!("failed to build HTTP client: {}", e)))?;

        info!("Created identity backend client for {}", base_url);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        bearer: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, self.endpoint(path));

        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        builder
    }

    async fn classify_failure(response: reqwest::Response) -> AuthError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_auth_failure(status, &body)
    }
}

/// Map a failed backend response onto the error taxonomy
///
/// The hosted service reports credential and confirmation failures with
/// 400-level statuses and a description field; everything else is a
/// generic backend failure.
fn classify_auth_failure(status: StatusCode, body: &str) -> AuthError {
    let parsed: BackendErrorBody = serde_json::from_str(body).unwrap_or_default();
    let description = parsed.description().unwrap_or("").to_lowercase();

    if description.contains("not confirmed") || description.contains("confirmation") {
        return AuthError::UnconfirmedAccount;
    }

    if description.contains("invalid login credentials")
        || description.contains("invalid grant")
        || status == StatusCode::UNAUTHORIZED
    {
        return AuthError::InvalidCredentials;
    }

    if description.contains("already registered") || description.contains("already exists") {
        return AuthError::AccountExists;
    }

    if (status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::FORBIDDEN)
        && (description.contains("token") || description.contains("otp"))
    {
        return AuthError::InvalidVerificationCode;
    }

    AuthError::Backend(format!(
        "backend returned {}: {}",
        status,
        if description.is_empty() {
            "no error description"
        } else {
            &description
        }
    ))
}

fn transport_error(e: reqwest::Error) -> AuthError {
    AuthError::Backend(format!("request failed: {}", e))
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        debug!("Password grant for {}", credentials.email);

        let response = self
            .request(
                reqwest::Method::POST,
                "auth/v1/token?grant_type=password",
                None,
            )
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }

        let grant: TokenGrantResponse = response.json().await.map_err(transport_error)?;
        let now = Utc::now();

        Ok(Session {
            access_token: grant.access_token,
            user_id: grant.user.id,
            issued_at: now,
            expires_at: now + Duration::seconds(grant.expires_in),
        })
    }

    async fn sign_up(&self, registration: &Registration) -> Result<RegisteredAccount, AuthError> {
        debug!("Signup for {}", registration.email);

        // Profile metadata rides along with the signup call; the plan
        // association is written separately by the caller.
        let response = self
            .request(reqwest::Method::POST, "auth/v1/signup", None)
            .json(&json!({
                "email": registration.email,
                "password": registration.password,
                "data": {
                    "first_name": registration.first_name,
                    "last_name": registration.last_name,
                    "user_type": registration.user_type,
                },
            }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }

        let signup: SignupResponse = response.json().await.map_err(transport_error)?;
        let user_id = signup
            .user
            .map(|u| u.id)
            .or(signup.id)
            .ok_or_else(|| AuthError::Backend("signup response missing user id".to_string()))?;

        let profile = UserProfile {
            id: user_id,
            first_name: registration.first_name.clone(),
            last_name: registration.last_name.clone(),
            user_type: registration.user_type,
            plan_id: None,
            created_at: Utc::now(),
        };

        // The hosted service always gates new accounts behind email
        // confirmation.
        Ok(RegisteredAccount {
            profile,
            confirmation_required: true,
        })
    }

    async fn confirm_account(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let response = self
            .request(reqwest::Method::POST, "auth/v1/verify", None)
            .json(&json!({
                "type": "signup",
                "email": email,
                "token": code,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }

        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .request(reqwest::Method::POST, "auth/v1/logout", Some(access_token))
            .send()
            .await
            .map_err(transport_error)?;

        // An already-invalid token is as signed out as it gets.
        if !response.status().is_success() && response.status() != StatusCode::UNAUTHORIZED {
            return Err(Self::classify_failure(response).await);
        }

        Ok(())
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, AuthError> {
        let path = format!("rest/v1/{}?id=eq.{}&select=*", PROFILES_TABLE, user_id);
        let response = self
            .request(reqwest::Method::GET, &path, None)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }

        let mut rows: Vec<UserProfile> = response.json().await.map_err(transport_error)?;
        if rows.is_empty() {
            return Err(AuthError::ProfileNotFound(user_id.to_string()));
        }

        Ok(rows.remove(0))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        changes: &ProfileChanges,
    ) -> Result<UserProfile, AuthError> {
        let path = format!("rest/v1/{}?id=eq.{}", PROFILES_TABLE, user_id);
        let response = self
            .request(reqwest::Method::PATCH, &path, None)
            .header("Prefer", "return=representation")
            .json(changes)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }

        let mut rows: Vec<UserProfile> = response.json().await.map_err(transport_error)?;
        if rows.is_empty() {
            return Err(AuthError::ProfileNotFound(user_id.to_string()));
        }

        Ok(rows.remove(0))
    }

    async fn assign_plan(&self, user_id: &str, plan_id: &str) -> Result<(), AuthError> {
        let path = format!("rest/v1/{}?id=eq.{}", PROFILES_TABLE, user_id);
        let response = self
            .request(reqwest::Method::PATCH, &path, None)
            .json(&json!({ "plan_id": plan_id }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            warn!("Plan assignment rejected by backend for user {}", user_id);
            return Err(Self::classify_failure(response).await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_are_classified() {
        let err = classify_auth_failure(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn unconfirmed_accounts_are_classified() {
        let err = classify_auth_failure(
            StatusCode::BAD_REQUEST,
            r#"{"error_description":"Email not confirmed"}"#,
        );
        assert!(matches!(err, AuthError::UnconfirmedAccount));
    }

    #[test]
    fn duplicate_signup_is_classified() {
        let err = classify_auth_failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"msg":"User already registered"}"#,
        );
        assert!(matches!(err, AuthError::AccountExists));
    }

    #[test]
    fn bad_verification_code_is_classified() {
        let err = classify_auth_failure(
            StatusCode::FORBIDDEN,
            r#"{"msg":"Token has expired or is invalid"}"#,
        );
        assert!(matches!(err, AuthError::InvalidVerificationCode));
    }

    #[test]
    fn everything_else_is_a_backend_error() {
        let err = classify_auth_failure(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(matches!(err, AuthError::Backend(_)));

        let err = classify_auth_failure(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, AuthError::Backend(_)));
    }

    #[test]
    fn unauthorized_without_description_is_a_credential_error() {
        let err = classify_auth_failure(StatusCode::UNAUTHORIZED, "{}");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn missing_base_url_is_rejected() {
        let config = BackendConfig::default();
        assert!(matches!(
            HttpAuthBackend::new(&config),
            Err(AuthError::Backend(_))
        ));
    }
}
