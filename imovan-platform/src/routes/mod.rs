//! Route registry and role-based route guard

pub mod guard;
pub mod registry;

pub use guard::{evaluate, evaluate_access, GuardDecision};
pub use registry::{RegistryError, RouteAccess, RouteDescriptor, RouteGroup, RouteRegistry};
