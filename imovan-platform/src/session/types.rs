//! Session types and structures

use chrono::{DateTime, Duration, Utc};
use imovan_core::{Session, UserProfile, UserType};
use serde::{Deserialize, Serialize};

/// The two client-side retention tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionTier {
    /// Survives process restarts; 7-day window ("remember me")
    Durable,
    /// Lives with the process; 15-minute window (default)
    Ephemeral,
}

impl std::fmt::Display for RetentionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetentionTier::Durable => write!(f, "durable"),
            RetentionTier::Ephemeral => write!(f, "ephemeral"),
        }
    }
}

/// A session with its retention deadline, as persisted in a storage tier
///
/// Serializes as `{ "session": ..., "expiresAt": <epoch-ms> }`, the record
/// format shared by both tiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSessionRecord {
    pub session: Session,
    /// Retention deadline; distinct from the issuer expiry on the session
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl PersistedSessionRecord {
    /// Create a record valid for `window` from now
    pub fn new(session: Session, window: Duration) -> Self {
        Self {
            session,
            expires_at: Utc::now() + window,
        }
    }

    /// Storage key shared by both tiers for this record
    pub fn key(&self) -> &str {
        &self.session.access_token
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Point-in-time view of authentication state for one request
///
/// The role flags are pure projections recomputed on every read; nothing
/// here is cached between navigations.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// The manager has not finished its startup restore yet
    pub loading: bool,
    pub session: Option<Session>,
    pub profile: Option<UserProfile>,
}

impl SessionSnapshot {
    /// Snapshot observed before the manager initialized
    pub fn loading() -> Self {
        Self {
            loading: true,
            session: None,
            profile: None,
        }
    }

    /// Snapshot for a request with no live session
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.profile.as_ref().map(|p| p.user_type)
    }

    /// Fleet-owning company user ("frotista")
    pub fn is_frotista(&self) -> bool {
        self.user_type() == Some(UserType::Client)
    }

    pub fn is_provider(&self) -> bool {
        self.user_type() == Some(UserType::Provider)
    }

    pub fn is_integrator(&self) -> bool {
        self.user_type() == Some(UserType::Integrator)
    }
}

/// Session lifecycle notifications for observers
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn { user_id: String },
    SignedOut { user_id: Option<String> },
    SessionRestored { user_id: String },
    SessionExpired { user_id: String },
    ProfileRefreshed { user_id: String },
}
