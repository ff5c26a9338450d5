//! Route definitions for the IMOVAN web server
//!
//! The axum router mirrors the static route registry: every protected
//! page route here carries the audience its registry descriptor declares.

use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Authentication
        .route("/auth/register", post(handlers::auth::register_user))
        .route("/auth/verify", post(handlers::auth::verify_account))
        .route("/auth/login", post(handlers::auth::login_user))
        .route("/auth/logout", post(handlers::auth::logout_user))
        .route("/auth/me", get(handlers::auth::get_current_user))
        // Profile
        .route(
            "/profile",
            get(handlers::profile::get_profile).patch(handlers::profile::update_profile),
        )
        .route("/profile/refresh", post(handlers::profile::refresh_profile))
        // Route registry
        .route("/routes", get(handlers::routes::site_map))
        .route("/routes/lookup", get(handlers::routes::lookup_route))
}

/// Create routed page endpoints
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::pages::home))
        .route("/login", get(handlers::pages::login_page))
        .route("/fleet-dashboard", get(handlers::pages::fleet_dashboard))
        .route(
            "/provider/dashboard",
            get(handlers::pages::provider_dashboard),
        )
        .route(
            "/integrator/dashboard",
            get(handlers::pages::integrator_dashboard),
        )
        .route("/account/profile", get(handlers::pages::account_profile))
}

/// Create all routes combined
pub fn all_routes() -> Router<AppState> {
    Router::new().nest("/api", api_routes()).merge(page_routes())
}
