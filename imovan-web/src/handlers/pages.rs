//! Page handlers
//!
//! JSON payloads for the routed pages. The dashboards are where the role
//! extractors actually bite: a wrong-role request never reaches the
//! handler body, it is redirected by the guard first.

use crate::auth::{CurrentUser, OptionalUser, RequireFrotista, RequireIntegrator, RequireProvider};
use axum::{extract::Query, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

/// Query parameters carried into the login page by guard redirects
#[derive(Debug, Deserialize)]
pub struct LoginPageParams {
    /// Destination to bounce back to after a successful login
    pub redirect: Option<String>,
    /// User-facing notice emitted by the guard
    pub notice: Option<String>,
}

/// Public landing page
pub async fn home(OptionalUser(snapshot): OptionalUser) -> Json<Value> {
    Json(json!({
        "title": "Home",
        "authenticated": snapshot.is_authenticated(),
    }))
}

/// Login page; echoes the preserved destination for the post-login bounce
pub async fn login_page(Query(params): Query<LoginPageParams>) -> Json<Value> {
    Json(json!({
        "title": "Sign In",
        "redirect": params.redirect,
        "notice": params.notice,
    }))
}

/// Fleet company dashboard
pub async fn fleet_dashboard(user: RequireFrotista) -> Json<Value> {
    Json(json!({
        "title": "Fleet Dashboard",
        "welcome": format!("Welcome back, {}", user.profile.full_name()),
        "user_type": user.profile.user_type,
        "plan_id": user.profile.plan_id,
    }))
}

/// Service provider dashboard
pub async fn provider_dashboard(user: RequireProvider) -> Json<Value> {
    Json(json!({
        "title": "Provider Dashboard",
        "welcome": format!("Welcome back, {}", user.profile.full_name()),
        "user_type": user.profile.user_type,
        "plan_id": user.profile.plan_id,
    }))
}

/// Integrator administration dashboard
pub async fn integrator_dashboard(user: RequireIntegrator) -> Json<Value> {
    Json(json!({
        "title": "Integrator Dashboard",
        "welcome": format!("Welcome back, {}", user.profile.full_name()),
        "user_type": user.profile.user_type,
        "plan_id": user.profile.plan_id,
    }))
}

/// Shared account page, any authenticated role
pub async fn account_profile(user: CurrentUser) -> Json<Value> {
    Json(json!({
        "title": "My Profile",
        "user_id": user.session.user_id,
        "profile": user.profile,
    }))
}
