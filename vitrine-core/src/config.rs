use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub credentials: CredentialConfig,
    pub relay: RelayConfig,
    pub broadcast: BroadcastConfig,
    pub viewer: ViewerConfig,
    pub logging: LoggingConfig,
}

/// Session registry collaborator (HTTP)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            auth_token: None,
            request_timeout_seconds: 10,
        }
    }
}

/// Credential service collaborator
///
/// When `local_secret` is set, credentials are minted locally with the HMAC
/// issuer instead of requesting them from `base_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    pub base_url: String,
    pub local_secret: Option<String>,
    pub token_ttl_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081/credentials".to_string(),
            local_secret: None,
            token_ttl_seconds: 600,
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub url: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: "memory://local".to_string(),
        }
    }
}

/// Broadcaster-side settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub snapshot_interval_seconds: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_seconds: 5,
        }
    }
}

/// Viewer-side settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub waiting_timeout_seconds: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            waiting_timeout_seconds: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus `VITRINE_*` environment
    /// overrides (e.g. `VITRINE_VIEWER__WAITING_TIMEOUT_SECONDS=10`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("vitrine").required(false)),
        };

        builder
            .add_source(Environment::with_prefix("VITRINE").separator("__"))
            .build()?
            .try_deserialize()
    }
}

impl BroadcastConfig {
    #[must_use]
    pub const fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_seconds)
    }
}

impl ViewerConfig {
    #[must_use]
    pub const fn waiting_timeout(&self) -> Duration {
        Duration::from_secs(self.waiting_timeout_seconds)
    }
}

impl CredentialConfig {
    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.broadcast.snapshot_interval(), Duration::from_secs(5));
        assert_eq!(config.viewer.waiting_timeout(), Duration::from_secs(6));
        assert_eq!(config.logging.format, "pretty");
        assert!(config.credentials.local_secret.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("create temp config");
        writeln!(
            file,
            "[viewer]\nwaiting_timeout_seconds = 9\n\n[registry]\nbase_url = \"http://registry.test\""
        )
        .expect("write temp config");

        let config = Config::load(Some(file.path())).expect("load config");
        assert_eq!(config.viewer.waiting_timeout_seconds, 9);
        assert_eq!(config.registry.base_url, "http://registry.test");
        // Untouched sections keep defaults
        assert_eq!(config.broadcast.snapshot_interval_seconds, 5);
    }
}
