//! RC Registry Adapter
//!
//! HTTP client for the vehicle registration-certificate registry. Each lookup
//! is a single `POST {base}/verification/vehicle-rc` carrying the
//! registration number, authenticated with client id and secret headers.
//!
//! # Error Handling
//!
//! - Transport timeout -> `VerificationOutcome::Timeout`
//! - Any HTTP response -> interpreted by
//!   [`VerificationOutcome::from_registry_response`] (non-2xx is `Error`)
//! - Missing credentials -> `PortError::Unauthorized`
//! - Circuit breaker open -> `PortError::ServiceUnavailable`
//! - Other transport failures -> `PortError::Connection`

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use core_kernel::{
    AdapterHealth, CircuitBreaker, CircuitBreakerConfig, CircuitState, DomainPort,
    HealthCheckResult, HealthCheckable, OperationMetadata, PortError,
};

use crate::ports::RcRegistryPort;
use crate::verification::VerificationOutcome;

const LOOKUP_PATH: &str = "/verification/vehicle-rc";

/// Registry deployment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl RegistryEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            RegistryEnvironment::Sandbox => "https://sandbox.cashfree.com",
            RegistryEnvironment::Production => "https://api.cashfree.com",
        }
    }
}

/// Configuration for the RC registry adapter
#[derive(Debug, Clone)]
pub struct RcRegistryConfig {
    pub environment: RegistryEnvironment,
    /// Replaces the environment's base URL when set
    pub base_url: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    /// Upper bound for one lookup, in seconds
    pub timeout_secs: u64,
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for RcRegistryConfig {
    fn default() -> Self {
        Self {
            environment: RegistryEnvironment::Sandbox,
            base_url: None,
            client_id: String::new(),
            client_secret: String::new(),
            timeout_secs: 10,
            circuit_breaker: Some(CircuitBreakerConfig {
                failure_threshold: 5,
                success_threshold: 3,
                reset_timeout_secs: 60,
            }),
        }
    }
}

impl RcRegistryConfig {
    /// Full lookup URL
    pub fn endpoint(&self) -> String {
        let base = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url());
        format!("{}{}", base.trim_end_matches('/'), LOOKUP_PATH)
    }

    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    vehicle_number: &'a str,
}

/// RC registry adapter implementing `RcRegistryPort`
///
/// # Example
///
/// ```rust,ignore
/// use domain_vehicle::adapters::{RcRegistryAdapter, RcRegistryConfig, RegistryEnvironment};
///
/// let adapter = RcRegistryAdapter::new(RcRegistryConfig {
///     environment: RegistryEnvironment::Production,
///     client_id: "client-id".to_string(),
///     client_secret: "client-secret".to_string(),
///     ..Default::default()
/// })?;
/// let outcome = adapter.lookup("MH12AB1234", None).await?;
/// ```
#[derive(Debug)]
pub struct RcRegistryAdapter {
    config: RcRegistryConfig,
    client: reqwest::Client,
    circuit_breaker: Option<CircuitBreaker>,
}

impl RcRegistryAdapter {
    /// Creates the adapter and its HTTP client
    ///
    /// # Errors
    ///
    /// Returns `PortError::Internal` if the HTTP client cannot be built
    pub fn new(config: RcRegistryConfig) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PortError::Internal {
                message: format!("Failed to build registry HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        let circuit_breaker = config.circuit_breaker.clone().map(CircuitBreaker::new);

        Ok(Self {
            config,
            client,
            circuit_breaker,
        })
    }

    /// Returns the lookup URL this adapter posts to
    pub fn endpoint(&self) -> String {
        self.config.endpoint()
    }

    /// State of the circuit; always closed without a breaker
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker
            .as_ref()
            .map_or(CircuitState::Closed, CircuitBreaker::state)
    }

    /// Returns true if a lookup would be refused without calling the registry
    pub fn is_circuit_open(&self) -> bool {
        self.circuit_breaker.as_ref().is_some_and(CircuitBreaker::is_open)
    }

    fn try_acquire(&self) -> bool {
        self.circuit_breaker.as_ref().map_or(true, CircuitBreaker::try_acquire)
    }

    fn record_failure(&self) {
        if let Some(ref cb) = self.circuit_breaker {
            cb.record_failure();
        }
    }

    fn record_success(&self) {
        if let Some(ref cb) = self.circuit_breaker {
            cb.record_success();
        }
    }
}

impl DomainPort for RcRegistryAdapter {}

#[async_trait]
impl HealthCheckable for RcRegistryAdapter {
    /// Reports configuration and circuit state without calling the registry
    async fn health_check(&self) -> HealthCheckResult {
        let (status, message) = if !self.config.has_credentials() {
            (
                AdapterHealth::Unhealthy,
                Some("RC registry credentials are not configured".to_string()),
            )
        } else if self.is_circuit_open() {
            (AdapterHealth::Degraded, Some("Circuit breaker is open".to_string()))
        } else {
            (AdapterHealth::Healthy, None)
        };

        HealthCheckResult {
            adapter_id: "rc-registry-adapter".to_string(),
            status,
            latency_ms: 0,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl RcRegistryPort for RcRegistryAdapter {
    async fn lookup(
        &self,
        registration_no: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<VerificationOutcome, PortError> {
        if !self.config.has_credentials() {
            return Err(PortError::Unauthorized {
                message: "RC registry credentials are not configured".to_string(),
            });
        }

        if !self.try_acquire() {
            return Err(PortError::ServiceUnavailable {
                service: "RC registry (circuit breaker open)".to_string(),
            });
        }

        let endpoint = self.config.endpoint();
        let correlation_id = metadata.and_then(|m| m.correlation_id);
        debug!(registration_no, %endpoint, ?correlation_id, "Looking up vehicle RC");

        let mut request = self
            .client
            .post(&endpoint)
            .header("x-client-id", self.config.client_id.as_str())
            .header("x-client-secret", self.config.client_secret.as_str())
            .json(&LookupRequest {
                vehicle_number: registration_no,
            });
        if let Some(ref id) = correlation_id {
            request = request.header("x-request-id", id.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                self.record_failure();
                warn!(registration_no, timeout_secs = self.config.timeout_secs, "RC lookup timed out");
                return Ok(VerificationOutcome::Timeout);
            }
            Err(e) => {
                self.record_failure();
                warn!(registration_no, error = %e, "RC registry unreachable");
                return Err(PortError::Connection {
                    message: format!("RC registry unreachable: {}", e),
                    source: Some(Box::new(e)),
                });
            }
        };

        let http_status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                self.record_failure();
                warn!(registration_no, "RC response body timed out");
                return Ok(VerificationOutcome::Timeout);
            }
            Err(e) => {
                self.record_failure();
                return Err(PortError::Connection {
                    message: format!("Failed to read RC registry response: {}", e),
                    source: Some(Box::new(e)),
                });
            }
        };

        if http_status.is_server_error() {
            self.record_failure();
        } else {
            self.record_success();
        }

        let outcome = VerificationOutcome::from_registry_response(http_status.as_u16(), &body);
        info!(
            registration_no,
            http_status = http_status.as_u16(),
            verified = outcome.is_success(),
            "RC lookup completed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RcRegistryConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.environment, RegistryEnvironment::Sandbox);
        assert!(config.circuit_breaker.is_some());
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_endpoint_per_environment() {
        let sandbox = RcRegistryConfig::default();
        assert_eq!(sandbox.endpoint(), "https://sandbox.cashfree.com/verification/vehicle-rc");

        let production = RcRegistryConfig {
            environment: RegistryEnvironment::Production,
            ..Default::default()
        };
        assert_eq!(production.endpoint(), "https://api.cashfree.com/verification/vehicle-rc");

        let custom = RcRegistryConfig {
            base_url: Some("http://localhost:9090/".to_string()),
            ..Default::default()
        };
        assert_eq!(custom.endpoint(), "http://localhost:9090/verification/vehicle-rc");
    }

    #[tokio::test]
    async fn test_lookup_without_credentials_fails_before_any_request() {
        let adapter = RcRegistryAdapter::new(RcRegistryConfig::default()).unwrap();
        let result = adapter.lookup("MH12AB1234", None).await;
        assert!(matches!(result, Err(PortError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_health_check_reports_missing_credentials() {
        let adapter = RcRegistryAdapter::new(RcRegistryConfig::default()).unwrap();
        let result = adapter.health_check().await;
        assert_eq!(result.adapter_id, "rc-registry-adapter");
        assert_eq!(result.status, AdapterHealth::Unhealthy);
    }

    #[tokio::test]
    async fn test_open_circuit_refuses_lookups_without_calling() {
        let adapter = RcRegistryAdapter::new(RcRegistryConfig {
            base_url: Some("http://127.0.0.1:9".to_string()),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            timeout_secs: 1,
            circuit_breaker: Some(CircuitBreakerConfig {
                failure_threshold: 1,
                success_threshold: 1,
                reset_timeout_secs: 60,
            }),
            ..Default::default()
        })
        .unwrap();

        let first = adapter.lookup("MH12AB1234", None).await;
        assert!(!matches!(first, Err(PortError::ServiceUnavailable { .. })));
        assert_eq!(adapter.circuit_state(), CircuitState::Open);

        let second = adapter.lookup("MH12AB1234", None).await;
        assert!(matches!(second, Err(PortError::ServiceUnavailable { .. })));
        assert_eq!(adapter.health_check().await.status, AdapterHealth::Degraded);
    }

    #[tokio::test]
    async fn test_circuit_breaker_initially_closed() {
        let adapter = RcRegistryAdapter::new(RcRegistryConfig::default()).unwrap();
        assert!(!adapter.is_circuit_open());
        assert_eq!(adapter.circuit_state(), CircuitState::Closed);
    }
}
