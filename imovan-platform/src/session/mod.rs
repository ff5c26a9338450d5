//! Session management
//!
//! Two-tier session persistence ("remember me") and the session manager
//! that owns authentication state for the platform.

pub mod manager;
pub mod storage;
pub mod types;

pub use manager::{LoginOutcome, RestoreReport, SessionManager, SessionPolicy};
pub use storage::{FileSessionTier, MemorySessionTier, SessionTier, SessionVault};
pub use types::{AuthEvent, PersistedSessionRecord, RetentionTier, SessionSnapshot};
