//! Vehicle Domain Ports
//!
//! The `RcRegistryPort` trait is the vehicle domain's view of the external
//! registration-certificate registry. Adapters:
//!
//! - **RcRegistryAdapter**: HTTP registry client (see `adapters`)
//! - **MockRcRegistry**: scripted outcomes for tests
//!
//! ```rust,ignore
//! use domain_vehicle::{RcRegistryPort, VerificationOutcome};
//!
//! match registry.lookup("MH12AB1234", None).await? {
//!     VerificationOutcome::Success { details, .. } => { /* map fields */ }
//!     VerificationOutcome::Error { message, .. } => { /* show message */ }
//!     VerificationOutcome::Timeout => { /* offer retry */ }
//! }
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, OperationMetadata, PortError};

use crate::verification::VerificationOutcome;

/// Registration certificate lookup
#[async_trait]
pub trait RcRegistryPort: DomainPort + HealthCheckable {
    /// Looks up a registration number
    ///
    /// Application-level failures (unknown vehicle, rejected lookup) come
    /// back as `Ok(VerificationOutcome::Error)`. A lookup that ran out of
    /// time is `Ok(VerificationOutcome::Timeout)`. `Err` is reserved for
    /// failures to reach the registry at all.
    async fn lookup(
        &self,
        registration_no: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<VerificationOutcome, PortError>;
}

/// Mock implementation of RcRegistryPort for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    enum Scripted {
        Outcome(VerificationOutcome),
        Unreachable(String),
    }

    /// Registry that answers from a script
    ///
    /// Unknown registration numbers get an `Error` outcome.
    #[derive(Debug, Default)]
    pub struct MockRcRegistry {
        responses: HashMap<String, Scripted>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl MockRcRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answers `registration_no` with a fixed outcome
        pub fn with_outcome(mut self, registration_no: &str, outcome: VerificationOutcome) -> Self {
            self.responses
                .insert(registration_no.to_string(), Scripted::Outcome(outcome));
            self
        }

        /// Answers `registration_no` with a connection failure
        pub fn with_unreachable(mut self, registration_no: &str, message: &str) -> Self {
            self.responses.insert(
                registration_no.to_string(),
                Scripted::Unreachable(message.to_string()),
            );
            self
        }

        /// Delays every answer
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Number of lookups made so far
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for MockRcRegistry {}

    #[async_trait]
    impl HealthCheckable for MockRcRegistry {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-rc-registry".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl RcRegistryPort for MockRcRegistry {
        async fn lookup(
            &self,
            registration_no: &str,
            _metadata: Option<OperationMetadata>,
        ) -> Result<VerificationOutcome, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match self.responses.get(registration_no) {
                Some(Scripted::Outcome(outcome)) => Ok(outcome.clone()),
                Some(Scripted::Unreachable(message)) => Err(PortError::connection(message.clone())),
                None => Ok(VerificationOutcome::Error {
                    message: "Vehicle not found".to_string(),
                    raw_response: r#"{"status":"INVALID","message":"Vehicle not found"}"#.to_string(),
                }),
            }
        }
    }
}
