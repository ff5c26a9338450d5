//! Static route registry
//!
//! The navigable surface of the application as data: route descriptors
//! grouped for display, with a flattened by-path index. The registry is
//! built once; duplicate paths across groups are a construction error, so
//! lookup order is always well defined.

use imovan_core::UserType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Audience a protected route admits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteAccess {
    Client,
    Provider,
    Integrator,
    /// Any authenticated user
    Any,
}

impl RouteAccess {
    /// Whether a user of the given role may enter
    pub fn admits(&self, user_type: UserType) -> bool {
        match self {
            RouteAccess::Any => true,
            RouteAccess::Client => user_type == UserType::Client,
            RouteAccess::Provider => user_type == UserType::Provider,
            RouteAccess::Integrator => user_type == UserType::Integrator,
        }
    }
}

/// Static metadata describing one navigable path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteDescriptor {
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<RouteAccess>,
}

impl RouteDescriptor {
    /// A route anyone can visit
    pub fn public(path: &str, title: &str) -> Self {
        Self {
            path: path.to_string(),
            title: title.to_string(),
            requires_auth: false,
            user_type: None,
        }
    }

    /// A route requiring an authenticated user of the given audience
    pub fn protected(path: &str, title: &str, access: RouteAccess) -> Self {
        Self {
            path: path.to_string(),
            title: title.to_string(),
            requires_auth: true,
            user_type: Some(access),
        }
    }
}

/// A named group of routes, used by navigation and the site map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteGroup {
    pub name: String,
    pub display_name: String,
    pub routes: Vec<RouteDescriptor>,
}

impl RouteGroup {
    pub fn new(name: &str, display_name: &str, routes: Vec<RouteDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            routes,
        }
    }
}

/// Route registry construction errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate route path across groups: {path}")]
    DuplicatePath { path: String },
}

/// The full route table, built once from grouped descriptors
pub struct RouteRegistry {
    groups: Vec<RouteGroup>,
    /// path -> (group index, route index)
    by_path: HashMap<String, (usize, usize)>,
}

impl RouteRegistry {
    /// Build a registry, failing fast on duplicate paths
    pub fn new(groups: Vec<RouteGroup>) -> Result<Self, RegistryError> {
        let mut by_path = HashMap::new();

        for (group_index, group) in groups.iter().enumerate() {
            for (route_index, route) in group.routes.iter().enumerate() {
                if by_path
                    .insert(route.path.clone(), (group_index, route_index))
                    .is_some()
                {
                    return Err(RegistryError::DuplicatePath {
                        path: route.path.clone(),
                    });
                }
            }
        }

        Ok(Self { groups, by_path })
    }

    /// The built-in IMOVAN route table
    pub fn builtin() -> Self {
        use RouteAccess::*;

        let groups = vec![
            RouteGroup::new(
                "public",
                "Marketplace",
                vec![
                    RouteDescriptor::public("/", "Home"),
                    RouteDescriptor::public("/services", "Services"),
                    RouteDescriptor::public("/plans", "Plans"),
                ],
            ),
            RouteGroup::new(
                "auth",
                "Account Access",
                vec![
                    RouteDescriptor::public("/login", "Sign In"),
                    RouteDescriptor::public("/register", "Create Account"),
                ],
            ),
            RouteGroup::new(
                "fleet",
                "Fleet Area",
                vec![
                    RouteDescriptor::protected("/fleet-dashboard", "Fleet Dashboard", Client),
                    RouteDescriptor::protected("/fleet/vehicles", "Vehicles", Client),
                    RouteDescriptor::protected("/fleet/service-orders", "Service Orders", Client),
                ],
            ),
            RouteGroup::new(
                "provider",
                "Provider Area",
                vec![
                    RouteDescriptor::protected(
                        "/provider/dashboard",
                        "Provider Dashboard",
                        Provider,
                    ),
                    RouteDescriptor::protected("/provider/services", "Offered Services", Provider),
                    RouteDescriptor::protected("/provider/orders", "Work Orders", Provider),
                ],
            ),
            RouteGroup::new(
                "integrator",
                "Integrator Area",
                vec![
                    RouteDescriptor::protected(
                        "/integrator/dashboard",
                        "Integrator Dashboard",
                        Integrator,
                    ),
                    RouteDescriptor::protected("/integrator/companies", "Companies", Integrator),
                    RouteDescriptor::protected("/integrator/plans", "Plan Management", Integrator),
                ],
            ),
            RouteGroup::new(
                "account",
                "Account",
                vec![RouteDescriptor::protected(
                    "/account/profile",
                    "My Profile",
                    Any,
                )],
            ),
        ];

        Self::new(groups).expect("built-in route table has unique paths")
    }

    /// Look up a descriptor by exact path
    pub fn get_route_by_path(&self, path: &str) -> Option<&RouteDescriptor> {
        let (group_index, route_index) = self.by_path.get(path)?;
        Some(&self.groups[*group_index].routes[*route_index])
    }

    /// Flattened view of every route in the registry
    pub fn all_routes(&self) -> Vec<&RouteDescriptor> {
        self.groups
            .iter()
            .flat_map(|group| group.routes.iter())
            .collect()
    }

    /// The grouped table, as consumed by the site-map endpoint
    pub fn groups(&self) -> &[RouteGroup] {
        &self.groups
    }

    /// Role-appropriate landing path after login or on a role mismatch
    pub fn landing_path(user_type: Option<UserType>) -> &'static str {
        match user_type {
            Some(user_type) => user_type.landing_path(),
            None => "/",
        }
    }
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_returns_integrator_dashboard() {
        let registry = RouteRegistry::builtin();

        let route = registry.get_route_by_path("/integrator/dashboard").unwrap();
        assert!(route.requires_auth);
        assert_eq!(route.user_type, Some(RouteAccess::Integrator));
        assert_eq!(route.title, "Integrator Dashboard");
    }

    #[test]
    fn unknown_paths_return_none() {
        let registry = RouteRegistry::builtin();
        assert!(registry.get_route_by_path("/does-not-exist").is_none());
    }

    #[test]
    fn duplicate_paths_across_groups_fail_fast() {
        let groups = vec![
            RouteGroup::new(
                "one",
                "One",
                vec![RouteDescriptor::public("/shared", "First")],
            ),
            RouteGroup::new(
                "two",
                "Two",
                vec![RouteDescriptor::public("/shared", "Second")],
            ),
        ];

        assert_eq!(
            RouteRegistry::new(groups).err(),
            Some(RegistryError::DuplicatePath {
                path: "/shared".to_string()
            })
        );
    }

    #[test]
    fn all_routes_flattens_every_group() {
        let registry = RouteRegistry::builtin();
        let all = registry.all_routes();

        assert_eq!(
            all.len(),
            registry
                .groups()
                .iter()
                .map(|group| group.routes.len())
                .sum::<usize>()
        );
        assert!(all.iter().any(|route| route.path == "/fleet-dashboard"));
    }

    #[test]
    fn landing_paths_cover_every_role_and_the_fallback() {
        assert_eq!(
            RouteRegistry::landing_path(Some(UserType::Client)),
            "/fleet-dashboard"
        );
        assert_eq!(
            RouteRegistry::landing_path(Some(UserType::Provider)),
            "/provider/dashboard"
        );
        assert_eq!(
            RouteRegistry::landing_path(Some(UserType::Integrator)),
            "/integrator/dashboard"
        );
        assert_eq!(RouteRegistry::landing_path(None), "/");
    }

    #[test]
    fn route_access_admits_matching_roles_only() {
        assert!(RouteAccess::Client.admits(UserType::Client));
        assert!(!RouteAccess::Client.admits(UserType::Provider));
        assert!(RouteAccess::Any.admits(UserType::Integrator));
    }
}
