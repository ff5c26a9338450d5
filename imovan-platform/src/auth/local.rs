//! Local identity backend
//!
//! In-memory account store with argon2 password hashing and opaque random
//! tokens. Stands in for the hosted identity service in development mode
//! and in the test suites, including the unconfirmed-account behavior.

use super::backend::{
    AuthBackend, Credentials, ProfileChanges, RegisteredAccount, Registration,
};
use super::error::AuthError;
use super::verification::VerificationCodeStore;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use base64::Engine;
use chrono::{Duration, Utc};
use imovan_core::{Session, UserProfile, UserType};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Internal account record with password hash
#[derive(Debug, Clone)]
struct LocalAccount {
    email: String,
    password_hash: String,
    confirmed: bool,
    profile: UserProfile,
}

/// In-memory identity backend for development and testing
pub struct LocalAuthBackend {
    accounts: RwLock<HashMap<String, LocalAccount>>,
    /// Issued access tokens, mapped to user ids
    tokens: RwLock<HashMap<String, String>>,
    verification: VerificationCodeStore,
    require_confirmation: bool,
    token_ttl: Duration,
}

impl LocalAuthBackend {
    /// Create an empty backend; accounts sign in immediately after signup
    /// unless `require_confirmation` is set
    pub fn new(require_confirmation: bool) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
            verification: VerificationCodeStore::default(),
            require_confirmation,
            token_ttl: Duration::hours(1),
        }
    }

    /// Create a backend seeded with one confirmed demo account per role
    ///
    /// New signups still require confirmation, mirroring the hosted
    /// service; their codes land in the development log.
    pub fn with_demo_accounts() -> Self {
        let backend = Self::new(true);

        for (email, first_name, last_name, user_type) in [
            ("frotista@imovan.dev", "Fleet", "Demo", UserType::Client),
            ("provider@imovan.dev", "Provider", "Demo", UserType::Provider),
            (
                "integrator@imovan.dev",
                "Integrator",
                "Demo",
                UserType::Integrator,
            ),
        ] {
            let registration = Registration {
                email: email.to_string(),
                password: "imovan123".to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                user_type,
                plan_id: None,
            };

            if let Err(e) = backend.insert_account(&registration, true) {
                warn!("Failed to seed demo account {}: {}", email, e);
            } else {
                info!("Seeded demo account: {}", email);
            }
        }

        backend
    }

    /// Pending verification code for an address, when confirmation is on
    /// (development stand-in for email delivery)
    pub fn pending_verification_code(&self, email: &str) -> Option<String> {
        self.verification.pending(email)
    }

    fn insert_account(
        &self,
        registration: &Registration,
        confirmed: bool,
    ) -> Result<UserProfile, AuthError> {
        let key = registration.email.to_lowercase();
        let mut accounts = self.accounts.write().unwrap();

        if accounts.contains_key(&key) {
            debug!("Signup rejected, email already registered: {}", key);
            return Err(AuthError::AccountExists);
        }

        let profile = UserProfile {
            id: Uuid::new_v4().to_string(),
            first_name: registration.first_name.clone(),
            last_name: registration.last_name.clone(),
            user_type: registration.user_type,
            plan_id: None,
            created_at: Utc::now(),
        };

        let account = LocalAccount {
            email: key.clone(),
            password_hash: hash_password(&registration.password)?,
            confirmed,
            profile: profile.clone(),
        };

        accounts.insert(key, account);
        Ok(profile)
    }

    fn mint_session(&self, user_id: &str) -> Session {
        let now = Utc::now();
        let access_token = generate_token();

        let mut tokens = self.tokens.write().unwrap();
        tokens.insert(access_token.clone(), user_id.to_string());

        Session {
            access_token,
            user_id: user_id.to_string(),
            issued_at: now,
            expires_at: now + self.token_ttl,
        }
    }

    fn with_profile_mut<T>(
        &self,
        user_id: &str,
        apply: impl FnOnce(&mut UserProfile) -> T,
    ) -> Result<T, AuthError> {
        let mut accounts = self.accounts.write().unwrap();
        let account = accounts
            .values_mut()
            .find(|account| account.profile.id == user_id)
            .ok_or_else(|| AuthError::ProfileNotFound(user_id.to_string()))?;

        Ok(apply(&mut account.profile))
    }
}

#[async_trait]
impl AuthBackend for LocalAuthBackend {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let key = credentials.email.to_lowercase();
        let account = {
            let accounts = self.accounts.read().unwrap();
            accounts
                .get(&key)
                .cloned()
                .ok_or(AuthError::InvalidCredentials)?
        };

        if !verify_password(&credentials.password, &account.password_hash) {
            warn!("Invalid password for account: {}", key);
            return Err(AuthError::InvalidCredentials);
        }

        if !account.confirmed {
            debug!("Sign-in blocked, account unconfirmed: {}", key);
            return Err(AuthError::UnconfirmedAccount);
        }

        debug!("Account authenticated: {}", key);
        Ok(self.mint_session(&account.profile.id))
    }

    async fn sign_up(&self, registration: &Registration) -> Result<RegisteredAccount, AuthError> {
        let profile = self.insert_account(registration, !self.require_confirmation)?;

        if self.require_confirmation {
            let code = self.verification.issue(&registration.email);
            // No mail transport in the local backend; surface the code in
            // the development log instead.
            info!(
                "Verification code for {}: {}",
                registration.email, code
            );
        }

        info!("Registered account: {}", registration.email);
        Ok(RegisteredAccount {
            profile,
            confirmation_required: self.require_confirmation,
        })
    }

    async fn confirm_account(&self, email: &str, code: &str) -> Result<(), AuthError> {
        if !self.verification.verify(email, code) {
            return Err(AuthError::InvalidVerificationCode);
        }

        let key = email.to_lowercase();
        let mut accounts = self.accounts.write().unwrap();
        let account = accounts
            .get_mut(&key)
            .ok_or(AuthError::InvalidCredentials)?;

        account.confirmed = true;
        info!("Account confirmed: {}", key);
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let mut tokens = self.tokens.write().unwrap();
        if tokens.remove(access_token).is_some() {
            debug!("Backend session invalidated");
        }
        Ok(())
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, AuthError> {
        let accounts = self.accounts.read().unwrap();
        accounts
            .values()
            .find(|account| account.profile.id == user_id)
            .map(|account| account.profile.clone())
            .ok_or_else(|| AuthError::ProfileNotFound(user_id.to_string()))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        changes: &ProfileChanges,
    ) -> Result<UserProfile, AuthError> {
        self.with_profile_mut(user_id, |profile| {
            if let Some(first_name) = &changes.first_name {
                profile.first_name = first_name.clone();
            }
            if let Some(last_name) = &changes.last_name {
                profile.last_name = last_name.clone();
            }
            if let Some(plan_id) = &changes.plan_id {
                profile.plan_id = Some(plan_id.clone());
            }
            profile.clone()
        })
    }

    async fn assign_plan(&self, user_id: &str, plan_id: &str) -> Result<(), AuthError> {
        self.with_profile_mut(user_id, |profile| {
            profile.plan_id = Some(plan_id.to_string());
        })
    }
}

/// Hash password using Argon2
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::Backend("password hashing failed".to_string()))
}

/// Verify password against hash
fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// 256-bit random token, base64url without padding
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str, user_type: UserType) -> Registration {
        Registration {
            email: email.to_string(),
            password: "secret123".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            user_type,
            plan_id: None,
        }
    }

    #[tokio::test]
    async fn signup_then_login_yields_session_for_same_user() {
        let backend = LocalAuthBackend::new(false);
        let registered = backend
            .sign_up(&registration("fleet@example.com", UserType::Client))
            .await
            .unwrap();
        assert!(!registered.confirmation_required);

        let session = backend
            .sign_in_with_password(&Credentials {
                email: "fleet@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.user_id, registered.profile.id);
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn wrong_password_is_a_credential_error() {
        let backend = LocalAuthBackend::new(false);
        backend
            .sign_up(&registration("fleet@example.com", UserType::Client))
            .await
            .unwrap();

        let result = backend
            .sign_in_with_password(&Credentials {
                email: "fleet@example.com".to_string(),
                password: "not-the-password".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let backend = LocalAuthBackend::new(false);
        backend
            .sign_up(&registration("fleet@example.com", UserType::Client))
            .await
            .unwrap();

        let result = backend
            .sign_up(&registration("Fleet@Example.com", UserType::Provider))
            .await;

        assert!(matches!(result, Err(AuthError::AccountExists)));
    }

    #[tokio::test]
    async fn unconfirmed_account_cannot_sign_in_until_verified() {
        let backend = LocalAuthBackend::new(true);
        let registered = backend
            .sign_up(&registration("fleet@example.com", UserType::Client))
            .await
            .unwrap();
        assert!(registered.confirmation_required);

        let credentials = Credentials {
            email: "fleet@example.com".to_string(),
            password: "secret123".to_string(),
        };

        let blocked = backend.sign_in_with_password(&credentials).await;
        assert!(matches!(blocked, Err(AuthError::UnconfirmedAccount)));

        let code = backend
            .pending_verification_code("fleet@example.com")
            .expect("code issued at signup");
        backend
            .confirm_account("fleet@example.com", &code)
            .await
            .unwrap();

        assert!(backend.sign_in_with_password(&credentials).await.is_ok());
    }

    #[tokio::test]
    async fn profile_updates_apply_partial_fields() {
        let backend = LocalAuthBackend::new(false);
        let registered = backend
            .sign_up(&registration("fleet@example.com", UserType::Client))
            .await
            .unwrap();

        let updated = backend
            .update_profile(
                &registered.profile.id,
                &ProfileChanges {
                    last_name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Test");
        assert_eq!(updated.last_name, "Renamed");

        backend
            .assign_plan(&registered.profile.id, "plan-pro")
            .await
            .unwrap();
        let fetched = backend.fetch_profile(&registered.profile.id).await.unwrap();
        assert_eq!(fetched.plan_id.as_deref(), Some("plan-pro"));
    }

    #[tokio::test]
    async fn demo_accounts_cover_all_roles() {
        let backend = LocalAuthBackend::with_demo_accounts();

        for email in [
            "frotista@imovan.dev",
            "provider@imovan.dev",
            "integrator@imovan.dev",
        ] {
            let session = backend
                .sign_in_with_password(&Credentials {
                    email: email.to_string(),
                    password: "imovan123".to_string(),
                })
                .await
                .unwrap();
            assert!(!session.access_token.is_empty());
        }
    }
}
