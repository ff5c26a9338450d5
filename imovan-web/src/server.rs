//! IMOVAN Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// How often expired session records are purged from both tiers
const PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Main IMOVAN web server
pub struct ImovanServer {
    config: WebConfig,
    state: AppState,
}

impl ImovanServer {
    /// Create a new server
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting IMOVAN web server");
        info!("Server address: http://{}", address);
        info!("Development mode: {}", self.config.dev_mode);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        // Periodic maintenance alongside the lazy read-time expiry.
        let purge_state = self.state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PURGE_INTERVAL);
            loop {
                interval.tick().await;
                match purge_state.sessions.purge_expired() {
                    Ok(0) => {}
                    Ok(purged) => info!("Purged {} expired session records", purged),
                    Err(e) => warn!("Session purge failed: {}", e),
                }
            }
        });

        if let Err(e) = serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Builder for ImovanServer
pub struct ImovanServerBuilder {
    config: WebConfig,
}

impl ImovanServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.dev_mode = dev_mode;
        self
    }

    /// Set the hosted identity backend URL
    pub fn backend_url<S: Into<String>>(mut self, backend_url: S) -> Self {
        self.config.backend_url = Some(backend_url.into());
        self
    }

    /// Set the durable session tier directory
    pub fn session_dir<P: Into<std::path::PathBuf>>(mut self, session_dir: P) -> Self {
        self.config.session_dir = Some(session_dir.into());
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<ImovanServer> {
        ImovanServer::new(self.config).await
    }
}

impl Default for ImovanServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_builder() {
        let builder = ImovanServerBuilder::new()
            .host("localhost")
            .port(3000)
            .dev_mode(true)
            .session_dir("/tmp/imovan-sessions");

        assert_eq!(builder.config.host, "localhost");
        assert_eq!(builder.config.port, 3000);
        assert!(builder.config.dev_mode);
        assert!(builder.config.session_dir.is_some());
    }

    #[test]
    fn test_config_address() {
        let config = WebConfig::default();
        assert_eq!(config.address(), "127.0.0.1:8080");
    }
}
