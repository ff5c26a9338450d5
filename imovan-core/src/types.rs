//! Core data types for the marketplace platform
//!
//! User roles, profiles, and session values shared by every layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User role classification across the marketplace
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Fleet-owning company ("frotista")
    Client,
    /// Automotive service provider
    Provider,
    /// Platform integrator administrator
    Integrator,
}

impl UserType {
    /// Landing path users of this role are sent to after login or on a
    /// role mismatch
    pub fn landing_path(&self) -> &'static str {
        match self {
            UserType::Client => "/fleet-dashboard",
            UserType::Provider => "/provider/dashboard",
            UserType::Integrator => "/integrator/dashboard",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Client => write!(f, "client"),
            UserType::Provider => write!(f, "provider"),
            UserType::Integrator => write!(f, "integrator"),
        }
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(UserType::Client),
            "provider" => Ok(UserType::Provider),
            "integrator" => Ok(UserType::Integrator),
            _ => Err(format!("Unknown user type: {}", s)),
        }
    }
}

/// Application-level user record, distinct from the authentication session
///
/// Owned by the backend's `user_profiles` table; cached in memory only for
/// the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Unique user identifier (matches the identity backend's user id)
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Role classification
    pub user_type: UserType,
    /// Subscription plan association (optional)
    pub plan_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Get user display string
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Opaque, time-bounded proof of authentication issued by the identity
/// backend
///
/// This code never mints these credentials; it only stores and forwards
/// them. The expiry here is the issuer's, not the local retention window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Bearer credential for backend calls
    pub access_token: String,
    /// Identity backend user id, used to fetch the profile
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Check whether the issuer-side expiry has passed
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
