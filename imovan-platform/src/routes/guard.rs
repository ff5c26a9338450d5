//! Route guard
//!
//! A pure function of the session snapshot and the route's requirements.
//! The guard holds no state and remembers no prior decision; it is
//! recomputed on every navigation.

use super::registry::{RouteAccess, RouteDescriptor, RouteRegistry};
use crate::session::SessionSnapshot;

/// Outcome of one guard evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    /// Startup restore has not finished; render a blocking wait, decide
    /// nothing yet
    Loading,
    /// No session; send the user to login, keeping the attempted
    /// destination for a post-login bounce-back
    RedirectToLogin { return_to: String },
    /// Session present but the profile is not cached yet and the route
    /// needs a specific role; wait rather than decide on missing data
    ProfilePending,
    /// Authenticated with the wrong role; send to the role's landing page
    RedirectToLanding { destination: String },
    /// Render the protected content
    Granted,
}

/// Evaluate a route descriptor against the current snapshot
pub fn evaluate(
    snapshot: &SessionSnapshot,
    route: &RouteDescriptor,
    requested_path: &str,
) -> GuardDecision {
    evaluate_access(snapshot, route.requires_auth, route.user_type, requested_path)
}

/// Evaluate raw route requirements against the current snapshot
pub fn evaluate_access(
    snapshot: &SessionSnapshot,
    requires_auth: bool,
    user_type: Option<RouteAccess>,
    requested_path: &str,
) -> GuardDecision {
    if !requires_auth {
        return GuardDecision::Granted;
    }

    if snapshot.loading {
        return GuardDecision::Loading;
    }

    if !snapshot.is_authenticated() {
        return GuardDecision::RedirectToLogin {
            return_to: requested_path.to_string(),
        };
    }

    match user_type {
        None | Some(RouteAccess::Any) => GuardDecision::Granted,
        Some(required) => match &snapshot.profile {
            None => GuardDecision::ProfilePending,
            Some(profile) if required.admits(profile.user_type) => GuardDecision::Granted,
            Some(profile) => GuardDecision::RedirectToLanding {
                destination: RouteRegistry::landing_path(Some(profile.user_type)).to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use imovan_core::{Session, UserProfile, UserType};

    fn session() -> Session {
        let now = Utc::now();
        Session {
            access_token: "token".to_string(),
            user_id: "user-1".to_string(),
            issued_at: now,
            expires_at: now + Duration::hours(1),
        }
    }

    fn profile(user_type: UserType) -> UserProfile {
        UserProfile {
            id: "user-1".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Souza".to_string(),
            user_type,
            plan_id: None,
            created_at: Utc::now(),
        }
    }

    fn authenticated(user_type: UserType) -> SessionSnapshot {
        SessionSnapshot {
            loading: false,
            session: Some(session()),
            profile: Some(profile(user_type)),
        }
    }

    fn client_route() -> RouteDescriptor {
        RouteDescriptor::protected("/fleet-dashboard", "Fleet Dashboard", RouteAccess::Client)
    }

    #[test]
    fn public_routes_are_always_granted() {
        let route = RouteDescriptor::public("/", "Home");

        assert_eq!(
            evaluate(&SessionSnapshot::loading(), &route, "/"),
            GuardDecision::Granted
        );
        assert_eq!(
            evaluate(&SessionSnapshot::unauthenticated(), &route, "/"),
            GuardDecision::Granted
        );
    }

    #[test]
    fn loading_blocks_any_protected_decision() {
        assert_eq!(
            evaluate(&SessionSnapshot::loading(), &client_route(), "/fleet-dashboard"),
            GuardDecision::Loading
        );
    }

    #[test]
    fn unauthenticated_users_are_sent_to_login_with_their_destination() {
        let decision = evaluate(
            &SessionSnapshot::unauthenticated(),
            &client_route(),
            "/fleet-dashboard",
        );

        assert_eq!(
            decision,
            GuardDecision::RedirectToLogin {
                return_to: "/fleet-dashboard".to_string()
            }
        );
    }

    #[test]
    fn missing_profile_defers_role_decisions() {
        let snapshot = SessionSnapshot {
            loading: false,
            session: Some(session()),
            profile: None,
        };

        assert_eq!(
            evaluate(&snapshot, &client_route(), "/fleet-dashboard"),
            GuardDecision::ProfilePending
        );
    }

    #[test]
    fn missing_profile_still_grants_any_audience_routes() {
        let snapshot = SessionSnapshot {
            loading: false,
            session: Some(session()),
            profile: None,
        };
        let route = RouteDescriptor::protected("/account/profile", "My Profile", RouteAccess::Any);

        assert_eq!(
            evaluate(&snapshot, &route, "/account/profile"),
            GuardDecision::Granted
        );
    }

    #[test]
    fn role_mismatch_redirects_to_the_users_own_landing_page() {
        let decision = evaluate(
            &authenticated(UserType::Provider),
            &client_route(),
            "/fleet-dashboard",
        );

        assert_eq!(
            decision,
            GuardDecision::RedirectToLanding {
                destination: "/provider/dashboard".to_string()
            }
        );
    }

    #[test]
    fn matching_role_is_granted() {
        assert_eq!(
            evaluate(
                &authenticated(UserType::Client),
                &client_route(),
                "/fleet-dashboard"
            ),
            GuardDecision::Granted
        );
    }

    #[test]
    fn integrator_hitting_provider_routes_lands_on_integrator_dashboard() {
        let route = RouteDescriptor::protected(
            "/provider/dashboard",
            "Provider Dashboard",
            RouteAccess::Provider,
        );

        let decision = evaluate(
            &authenticated(UserType::Integrator),
            &route,
            "/provider/dashboard",
        );

        assert_eq!(
            decision,
            GuardDecision::RedirectToLanding {
                destination: "/integrator/dashboard".to_string()
            }
        );
    }
}
