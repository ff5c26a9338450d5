//! Application state management

use crate::{WebConfig, WebError, WebResult};
use imovan_core::{BackendConfig, SessionRetentionConfig};
use imovan_platform::{
    AuthBackend, FileSessionTier, HttpAuthBackend, LocalAuthBackend, MemorySessionTier,
    RouteRegistry, SessionManager, SessionPolicy, SessionVault,
};
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// Authoritative session state owner
    pub sessions: Arc<SessionManager>,
    /// Static route table
    pub registry: Arc<RouteRegistry>,
}

impl AppState {
    /// Create a new application state
    ///
    /// Selects the identity backend (hosted service when a backend URL is
    /// configured, local development store otherwise), wires the two
    /// session tiers, and runs the one-time session restore before any
    /// request is served.
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let backend: Arc<dyn AuthBackend> = match &config.backend_url {
            Some(_) => {
                let backend_config = BackendConfig {
                    base_url: config.backend_url.clone(),
                    api_key: config.backend_api_key.clone(),
                    timeout_secs: 30,
                };
                let backend = HttpAuthBackend::new(&backend_config).map_err(|e| {
                    WebError::Config(format!("Failed to create identity backend: {}", e))
                })?;
                info!("Using hosted identity backend");
                Arc::new(backend)
            }
            None => {
                info!("No backend URL configured; using local development backend");
                Arc::new(LocalAuthBackend::with_demo_accounts())
            }
        };

        let retention = SessionRetentionConfig {
            durable_days: config.durable_days,
            ephemeral_minutes: config.ephemeral_minutes,
            storage_dir: config.session_dir.clone(),
        };
        let session_dir = retention.resolve_storage_dir();
        let vault = SessionVault::new(
            Arc::new(FileSessionTier::new(&session_dir)?),
            Arc::new(MemorySessionTier::new()),
        );

        let sessions = SessionManager::new(backend, vault, SessionPolicy::from_config(&retention));
        let report = sessions.initialize().await?;
        info!(
            restored = report.restored,
            purged = report.purged,
            "Session restore complete"
        );

        let state = Self {
            config,
            sessions: Arc::new(sessions),
            registry: Arc::new(RouteRegistry::builtin()),
        };

        info!("Application state initialized successfully");
        Ok(state)
    }
}
