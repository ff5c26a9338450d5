//! Identity backends and authentication primitives
//!
//! The hosted identity/data service is consumed behind the [`AuthBackend`]
//! trait so the rest of the platform never talks HTTP directly. A local
//! in-memory backend covers development mode and the test suites.

pub mod backend;
pub mod error;
pub mod http;
pub mod local;
pub mod verification;

pub use backend::{
    AuthBackend, Credentials, ProfileChanges, RegisteredAccount, Registration,
};
pub use error::AuthError;
pub use http::HttpAuthBackend;
pub use local::LocalAuthBackend;
pub use verification::VerificationCodeStore;
