//! Configuration management
//!
//! Platform configuration with environment and TOML file loading.

use crate::error::{ImovanError, ImovanResult};
use crate::{config_error, validation_error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Identity/data backend settings
    pub backend: BackendConfig,
    /// Session retention settings
    pub session: SessionRetentionConfig,
    /// Logging settings
    pub logging: crate::logging::LoggingConfig,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            session: SessionRetentionConfig::default(),
            logging: crate::logging::LoggingConfig::default(),
        }
    }
}

/// Hosted identity/data service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted backend; when absent the platform runs with
    /// the local development backend
    pub base_url: Option<String>,
    /// Public API key sent with every backend request
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Retention windows for the two session storage tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRetentionConfig {
    /// Durable tier validity window in days ("remember me")
    pub durable_days: i64,
    /// Ephemeral tier validity window in minutes (default tier)
    pub ephemeral_minutes: i64,
    /// Directory for the durable tier; resolved under the platform data
    /// directory when absent
    pub storage_dir: Option<PathBuf>,
}

impl Default for SessionRetentionConfig {
    fn default() -> Self {
        Self {
            durable_days: 7,
            ephemeral_minutes: 15,
            storage_dir: None,
        }
    }
}

impl SessionRetentionConfig {
    /// Validity window applied to durable-tier records
    pub fn durable_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.durable_days)
    }

    /// Validity window applied to ephemeral-tier records
    pub fn ephemeral_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ephemeral_minutes)
    }

    /// Resolve the durable tier directory
    pub fn resolve_storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("imovan")
                .join("sessions")
        })
    }
}

impl PlatformConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ImovanResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| config_error!(format!("Failed to read config file: {}", e), "config", e))?;

        let config: PlatformConfig = toml::from_str(&content)
            .map_err(|e| config_error!(format!("Failed to parse config: {}", e), "config", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.backend.base_url = std::env::var("IMOVAN_BACKEND_URL").ok();
        config.backend.api_key = std::env::var("IMOVAN_BACKEND_KEY").ok();
        if let Some(timeout) = std::env::var("IMOVAN_BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.backend.timeout_secs = timeout;
        }
        config.session.storage_dir = std::env::var("IMOVAN_SESSION_DIR").ok().map(PathBuf::from);
        if let Ok(level) = std::env::var("IMOVAN_LOG_LEVEL") {
            config.logging.level = level;
        }

        config
    }

    /// Validate configuration values
    pub fn validate(&self) -> ImovanResult<()> {
        if self.session.durable_days <= 0 {
            return Err(validation_error!(
                "durable retention window must be positive",
                "session.durable_days",
                "config"
            ));
        }

        if self.session.ephemeral_minutes <= 0 {
            return Err(validation_error!(
                "ephemeral retention window must be positive",
                "session.ephemeral_minutes",
                "config"
            ));
        }

        if let Some(url) = &self.backend.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(validation_error!(
                    "backend base URL must be an http(s) URL",
                    "backend.base_url",
                    "config"
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retention_windows_match_policy() {
        let config = SessionRetentionConfig::default();
        assert_eq!(config.durable_window(), chrono::Duration::days(7));
        assert_eq!(config.ephemeral_window(), chrono::Duration::minutes(15));
    }

    #[test]
    fn validation_rejects_non_positive_windows() {
        let mut config = PlatformConfig::default();
        config.session.ephemeral_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_malformed_backend_url() {
        let mut config = PlatformConfig::default();
        config.backend.base_url = Some("ftp://backend.example".to_string());
        assert!(matches!(
            config.validate(),
            Err(ImovanError::Validation { .. })
        ));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = PlatformConfig::default();
        let toml_text = toml::to_string(&config).unwrap();
        let parsed: PlatformConfig = toml::from_str(&toml_text).unwrap();
        assert_eq!(parsed.session.durable_days, 7);
        assert_eq!(parsed.backend.timeout_secs, 30);
    }
}
