//! IMOVAN Web Server
//!
//! HTTP surface of the marketplace platform: authentication endpoints,
//! role-guarded page routes, and the site-map API.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use error::ApiError;
pub use server::ImovanServer;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use std::path::PathBuf;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    // Configure CORS for the local frontend dev server
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
        .allow_origin("http://127.0.0.1:3000".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    routes::all_routes()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable development mode (local identity backend, demo accounts)
    pub dev_mode: bool,
    /// Hosted identity/data service URL; absent means development mode
    pub backend_url: Option<String>,
    /// Public API key for the hosted backend
    pub backend_api_key: Option<String>,
    /// Directory for the durable session tier
    pub session_dir: Option<PathBuf>,
    /// Durable tier validity window in days ("remember me")
    pub durable_days: i64,
    /// Ephemeral tier validity window in minutes (default tier)
    pub ephemeral_minutes: i64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
            backend_url: None,
            backend_api_key: None,
            session_dir: None,
            durable_days: 7,
            ephemeral_minutes: 15,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("IMOVAN_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("IMOVAN_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            dev_mode: std::env::var("IMOVAN_DEV_MODE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            backend_url: std::env::var("IMOVAN_BACKEND_URL").ok(),
            backend_api_key: std::env::var("IMOVAN_BACKEND_KEY").ok(),
            session_dir: std::env::var("IMOVAN_SESSION_DIR").ok().map(PathBuf::from),
            durable_days: std::env::var("IMOVAN_DURABLE_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
            ephemeral_minutes: std::env::var("IMOVAN_EPHEMERAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
        }
    }

    /// Apply the backend and session sections of a platform configuration
    /// file; CLI flags and environment variables still win afterwards
    pub fn apply_platform_config(&mut self, platform: &imovan_core::PlatformConfig) {
        if platform.backend.base_url.is_some() {
            self.backend_url = platform.backend.base_url.clone();
        }
        if platform.backend.api_key.is_some() {
            self.backend_api_key = platform.backend.api_key.clone();
        }
        if platform.session.storage_dir.is_some() {
            self.session_dir = platform.session.storage_dir.clone();
        }
        self.durable_days = platform.session.durable_days;
        self.ephemeral_minutes = platform.session.ephemeral_minutes;
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Platform error: {0}")]
    Platform(#[from] imovan_platform::PlatformError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

/// Initialize logging for the web server
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imovan_web=debug,imovan_platform=debug,tower_http=debug".into()),
        )
        .init();
}
