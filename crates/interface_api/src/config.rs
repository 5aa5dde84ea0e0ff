//! API configuration

use serde::Deserialize;

use domain_vehicle::{RcRegistryConfig, RegistryEnvironment};
use domain_workflow::ClaimLimits;

/// RC registry connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub environment: RegistryEnvironment,
    /// Overrides the environment's base URL
    pub base_url: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_secs: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            environment: RegistryEnvironment::Sandbox,
            base_url: None,
            client_id: String::new(),
            client_secret: String::new(),
            timeout_secs: 10,
        }
    }
}

impl RegistrySettings {
    /// Adapter configuration with the default circuit breaker
    pub fn adapter_config(&self) -> RcRegistryConfig {
        RcRegistryConfig {
            environment: self.environment,
            base_url: self.base_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            timeout_secs: self.timeout_secs,
            ..RcRegistryConfig::default()
        }
    }
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// PostgreSQL URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    /// Log level
    pub log_level: String,
    pub registry: RegistrySettings,
    /// Claim intake limits, e.g. `API_CLAIMS__MAX_CLAIMS_PER_POLICY`
    pub claims: ClaimLimits,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: None,
            log_level: "info".to_string(),
            registry: RegistrySettings::default(),
            claims: ClaimLimits::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables
    ///
    /// Nested keys use a double underscore, e.g. `API_REGISTRY__CLIENT_ID`.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("API")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
