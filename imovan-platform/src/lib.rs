//! IMOVAN Platform - Session and access management services
//!
//! This crate provides the application-layer services of the marketplace
//! platform:
//!
//! - Identity backends (hosted service client and a local development store)
//! - Session management with two-tier persistence ("remember me")
//! - The static route registry and the role-based route guard
//!
//! ## Architecture
//!
//! The layering follows a clear separation:
//! - **Core** (imovan-core): shared types, errors, configuration
//! - **Platform** (this crate): session and access services
//! - **Presentation** (imovan-web): HTTP endpoints and extractors

pub mod auth;
pub mod routes;
pub mod session;

pub use auth::{
    AuthBackend, AuthError, Credentials, HttpAuthBackend, LocalAuthBackend, ProfileChanges,
    RegisteredAccount, Registration, VerificationCodeStore,
};
pub use routes::{GuardDecision, RegistryError, RouteAccess, RouteDescriptor, RouteGroup, RouteRegistry};
pub use session::{
    AuthEvent, FileSessionTier, LoginOutcome, MemorySessionTier, PersistedSessionRecord,
    RestoreReport, RetentionTier, SessionManager, SessionPolicy, SessionSnapshot, SessionTier,
    SessionVault,
};

/// Platform-level error type
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Authentication error: {0}")]
    Auth(#[from] auth::AuthError),

    #[error("Core error: {0}")]
    Core(#[from] imovan_core::ImovanError),

    #[error("Route registry error: {0}")]
    Registry(#[from] routes::RegistryError),

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PlatformResult<T> = Result<T, PlatformError>;

impl PlatformError {
    /// Create a session error
    pub fn session<S: Into<String>>(message: S) -> Self {
        Self::Session {
            message: message.into(),
        }
    }
}
