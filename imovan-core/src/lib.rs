//! IMOVAN Core - Core data structures shared across the platform
//!
//! This crate defines the foundational types for the marketplace platform:
//! user profiles and roles, session values, the unified error system, and
//! configuration/logging setup used by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
