//! Session Manager - the authoritative owner of authentication state
//!
//! Authenticates users against the identity backend, persists sessions in
//! the two retention tiers, restores them at startup, and mediates all
//! profile reads and writes. Every session-mutating path funnels through
//! the vault's single commit discipline; observers get broadcast events
//! instead of a second write path.

use super::storage::SessionVault;
use super::types::{AuthEvent, PersistedSessionRecord, RetentionTier, SessionSnapshot};
use crate::auth::{
    AuthBackend, AuthError, Credentials, ProfileChanges, RegisteredAccount, Registration,
};
use crate::PlatformResult;
use chrono::{DateTime, Duration, Utc};
use imovan_core::{Session, SessionRetentionConfig, UserProfile};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Retention windows applied when persisting sessions
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Window for the durable tier ("remember me")
    pub durable_window: Duration,
    /// Window for the ephemeral tier (default)
    pub ephemeral_window: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            durable_window: Duration::days(7),
            ephemeral_window: Duration::minutes(15),
        }
    }
}

impl SessionPolicy {
    pub fn from_config(config: &SessionRetentionConfig) -> Self {
        Self {
            durable_window: config.durable_window(),
            ephemeral_window: config.ephemeral_window(),
        }
    }

    fn window_for(&self, tier: RetentionTier) -> Duration {
        match tier {
            RetentionTier::Durable => self.durable_window,
            RetentionTier::Ephemeral => self.ephemeral_window,
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    /// Profile cache state right after login; `None` when the fetch failed
    /// (non-fatal, the next read retries)
    pub profile: Option<UserProfile>,
    /// Which tier now holds the record
    pub tier: RetentionTier,
    /// Retention deadline of the persisted record
    pub record_expires_at: DateTime<Utc>,
}

/// Summary of the startup restore pass
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    /// Records adopted as live sessions
    pub restored: usize,
    /// Expired records dropped from the tiers
    pub purged: usize,
}

/// Authoritative session state owner
pub struct SessionManager {
    backend: Arc<dyn AuthBackend>,
    vault: SessionVault,
    policy: SessionPolicy,
    /// In-memory profile cache for the lifetime of each session; never
    /// persisted
    profiles: RwLock<HashMap<String, UserProfile>>,
    events: broadcast::Sender<AuthEvent>,
    initialized: AtomicBool,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn AuthBackend>, vault: SessionVault, policy: SessionPolicy) -> Self {
        let (events, _) = broadcast::channel::<AuthEvent>(64);

        Self {
            backend,
            vault,
            policy,
            profiles: RwLock::new(HashMap::new()),
            events,
            initialized: AtomicBool::new(false),
        }
    }

    /// Restore persisted sessions at process start
    ///
    /// Runs exactly once per process lifetime; repeated calls are logged
    /// no-ops. Expired records are purged from both tiers; live ones are
    /// adopted and their profiles prefetched (fetch failures are non-fatal,
    /// the next read retries).
    pub async fn initialize(&self) -> PlatformResult<RestoreReport> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            warn!("Session manager already initialized; ignoring repeated call");
            return Ok(RestoreReport::default());
        }

        let now = Utc::now();
        let purged = self.vault.purge_expired(now)?;

        let mut restored = 0;
        for record in self.vault.live_records(now)? {
            let user_id = record.session.user_id.clone();

            match self.backend.fetch_profile(&user_id).await {
                Ok(profile) => {
                    self.profiles.write().await.insert(user_id.clone(), profile);
                }
                Err(e) => {
                    warn!("Profile prefetch failed for restored session: {}", e);
                }
            }

            let _ = self.events.send(AuthEvent::SessionRestored {
                user_id: user_id.clone(),
            });
            restored += 1;
        }

        info!(
            restored = restored,
            purged = purged,
            "Session manager initialized"
        );

        Ok(RestoreReport { restored, purged })
    }

    /// Whether the startup restore has run
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Password-grant login
    ///
    /// Persists the session into the tier selected by `remember_me` and
    /// clears the other tier for that key. Does not navigate; that belongs
    /// to the caller reacting to the state change.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> PlatformResult<LoginOutcome> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials.into());
        }

        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };

        // Failures are already classified by the backend; nothing is
        // persisted on that path.
        let session = self.backend.sign_in_with_password(&credentials).await?;

        let tier = if remember_me {
            RetentionTier::Durable
        } else {
            RetentionTier::Ephemeral
        };
        let record = PersistedSessionRecord::new(session.clone(), self.policy.window_for(tier));
        self.vault.commit(tier, &record)?;

        info!(
            user_id = %session.user_id,
            tier = %tier,
            "User signed in"
        );

        let profile = match self.backend.fetch_profile(&session.user_id).await {
            Ok(profile) => {
                let mut profiles = self.profiles.write().await;
                profiles.insert(session.user_id.clone(), profile.clone());
                Some(profile)
            }
            Err(e) => {
                warn!("Profile fetch after login failed: {}", e);
                None
            }
        };

        let _ = self.events.send(AuthEvent::SignedIn {
            user_id: session.user_id.clone(),
        });

        Ok(LoginOutcome {
            session,
            profile,
            tier,
            record_expires_at: record.expires_at,
        })
    }

    /// Create an account, then associate the plan in a second round trip
    ///
    /// Plan-association failure is logged and does not fail the overall
    /// registration.
    pub async fn register(&self, registration: Registration) -> PlatformResult<RegisteredAccount> {
        if registration.email.is_empty() || registration.password.is_empty() {
            return Err(AuthError::MissingCredentials.into());
        }
        if registration.password.len() < 6 {
            return Err(AuthError::InvalidCredentials.into());
        }

        let mut registered = self.backend.sign_up(&registration).await?;

        if let Some(plan_id) = &registration.plan_id {
            match self.backend.assign_plan(&registered.profile.id, plan_id).await {
                Ok(()) => {
                    registered.profile.plan_id = Some(plan_id.clone());
                }
                Err(e) => {
                    warn!(
                        user_id = %registered.profile.id,
                        "Plan association after signup failed: {}",
                        e
                    );
                }
            }
        }

        info!(user_id = %registered.profile.id, "User registered");
        Ok(registered)
    }

    /// Confirm a pending account with its verification code
    pub async fn confirm_account(&self, email: &str, code: &str) -> PlatformResult<()> {
        self.backend.confirm_account(email, code).await?;
        Ok(())
    }

    /// End the session: best-effort backend invalidation, then clear both
    /// tiers and the cached profile
    ///
    /// Idempotent; calling it without a live session still leaves both
    /// tiers empty.
    pub async fn logout(&self, access_token: &str) -> PlatformResult<()> {
        let existing = self.vault.resolve(access_token)?;

        if let Some((record, _)) = &existing {
            if let Err(e) = self.backend.sign_out(access_token).await {
                warn!("Backend sign-out failed: {}", e);
            }
            self.profiles.write().await.remove(&record.session.user_id);
        }

        self.vault.clear(access_token)?;

        let user_id = existing.map(|(record, _)| record.session.user_id);
        if let Some(id) = &user_id {
            info!(user_id = %id, "User signed out");
        }
        let _ = self.events.send(AuthEvent::SignedOut { user_id });

        Ok(())
    }

    /// Per-navigation read of authentication state
    ///
    /// Reads the record (durable tier first), lazily detects expiry, and
    /// fetches the profile on cache miss. Reading never renews the
    /// retention window.
    pub async fn authenticate(&self, access_token: &str) -> PlatformResult<SessionSnapshot> {
        if !self.is_initialized() {
            return Ok(SessionSnapshot::loading());
        }

        let Some((record, tier)) = self.vault.resolve(access_token)? else {
            return Ok(SessionSnapshot::unauthenticated());
        };

        if record.is_expired() {
            // Expiry is detected at read time and cleared silently; the
            // caller just observes an unauthenticated state.
            let user_id = record.session.user_id.clone();
            self.vault.clear(access_token)?;
            self.profiles.write().await.remove(&user_id);

            debug!(user_id = %user_id, tier = %tier, "Session record expired");
            let _ = self.events.send(AuthEvent::SessionExpired { user_id });

            return Ok(SessionSnapshot::unauthenticated());
        }

        let profile = self.profile_for(&record.session.user_id).await;

        Ok(SessionSnapshot {
            loading: false,
            session: Some(record.session),
            profile,
        })
    }

    /// Re-fetch the profile for the current session and replace the cache
    pub async fn refresh_profile(&self, access_token: &str) -> PlatformResult<UserProfile> {
        let record = self.require_session(access_token)?;
        let user_id = record.session.user_id;

        let profile = self.backend.fetch_profile(&user_id).await?;
        self.profiles
            .write()
            .await
            .insert(user_id.clone(), profile.clone());

        let _ = self.events.send(AuthEvent::ProfileRefreshed { user_id });
        Ok(profile)
    }

    /// Write partial profile fields, then refresh the cached copy
    ///
    /// Fails loudly when no live session exists.
    pub async fn update_profile(
        &self,
        access_token: &str,
        changes: &ProfileChanges,
    ) -> PlatformResult<UserProfile> {
        let record = self.require_session(access_token)?;
        let user_id = record.session.user_id;

        self.backend.update_profile(&user_id, changes).await?;

        let profile = self.backend.fetch_profile(&user_id).await?;
        self.profiles
            .write()
            .await
            .insert(user_id.clone(), profile.clone());

        info!(user_id = %user_id, "Profile updated");
        let _ = self.events.send(AuthEvent::ProfileRefreshed { user_id });
        Ok(profile)
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Drop expired records from both tiers (periodic maintenance)
    pub fn purge_expired(&self) -> PlatformResult<usize> {
        self.vault.purge_expired(Utc::now())
    }

    /// Storage vault handle
    pub fn vault(&self) -> &SessionVault {
        &self.vault
    }

    fn require_session(&self, access_token: &str) -> Result<PersistedSessionRecord, AuthError> {
        let resolved = self
            .vault
            .resolve(access_token)
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        match resolved {
            Some((record, _)) if !record.is_expired() => Ok(record),
            Some((record, _)) => {
                let _ = self.vault.clear(access_token);
                debug!(user_id = %record.session.user_id, "Session expired on mutation attempt");
                Err(AuthError::SessionRequired)
            }
            None => Err(AuthError::SessionRequired),
        }
    }

    async fn profile_for(&self, user_id: &str) -> Option<UserProfile> {
        {
            let profiles = self.profiles.read().await;
            if let Some(profile) = profiles.get(user_id) {
                return Some(profile.clone());
            }
        }

        match self.backend.fetch_profile(user_id).await {
            Ok(profile) => {
                let mut profiles = self.profiles.write().await;
                profiles.insert(user_id.to_string(), profile.clone());
                Some(profile)
            }
            Err(e) => {
                warn!("Profile fetch failed for {}: {}", user_id, e);
                None
            }
        }
    }
}
