//! Server procedure port
//!
//! Entity-specific business operations (issuing a policy, posting a
//! settlement, applying a payment) sit behind this port. The workflow only
//! needs to know whether a procedure succeeded and which document it
//! created.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{DocType, DomainPort, HealthCheckable, OperationMetadata, PortError};

use crate::validation::PolicyPayment;

/// Reference to the document a procedure created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub doctype: DocType,
    pub name: String,
}

impl ArtifactRef {
    pub fn new(doctype: DocType, name: impl Into<String>) -> Self {
        Self {
            doctype,
            name: name.into(),
        }
    }
}

/// Port for server-side procedures
///
/// Implementations enforce their own preconditions; a precondition that no
/// longer holds is reported as `PortError::Conflict`.
#[async_trait]
pub trait ServerProcedures: DomainPort + HealthCheckable {
    /// Creates a draft payment entry for an approved proposal's premium
    async fn create_proposal_payment_entry(
        &self,
        proposal: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, PortError>;

    /// Submits a draft payment entry and applies it to what it references
    async fn submit_payment_entry(
        &self,
        payment_entry: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, PortError>;

    /// Issues a policy from an approved, paid proposal
    async fn create_policy_from_proposal(
        &self,
        proposal: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, PortError>;

    /// Records and submits a premium payment against a policy
    async fn record_policy_payment(
        &self,
        policy: &str,
        payment: &PolicyPayment,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, PortError>;

    /// Posts the settlement journal entry for an approved claim
    async fn create_settlement_journal_entry(
        &self,
        claim: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, PortError>;
}

/// Mock implementation of ServerProcedures for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Records every call and answers with generated artifact names
    #[derive(Debug, Default)]
    pub struct MockServerProcedures {
        calls: Mutex<Vec<(String, String)>>,
        failures: HashMap<String, String>,
        counter: AtomicUsize,
    }

    impl MockServerProcedures {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes the named procedure fail with an internal error
        pub fn with_failure(mut self, procedure: &str, message: &str) -> Self {
            self.failures.insert(procedure.to_string(), message.to_string());
            self
        }

        /// Procedure names and targets, in call order
        pub async fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().await.clone()
        }

        async fn answer(&self, procedure: &str, target: &str, doctype: DocType, prefix: &str) -> Result<ArtifactRef, PortError> {
            self.calls
                .lock()
                .await
                .push((procedure.to_string(), target.to_string()));
            if let Some(message) = self.failures.get(procedure) {
                return Err(PortError::internal(message.clone()));
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ArtifactRef::new(doctype, format!("{}-MOCK-{:05}", prefix, n)))
        }
    }

    impl DomainPort for MockServerProcedures {}

    #[async_trait]
    impl HealthCheckable for MockServerProcedures {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-server-procedures".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl ServerProcedures for MockServerProcedures {
        async fn create_proposal_payment_entry(
            &self,
            proposal: &str,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ArtifactRef, PortError> {
            self.answer("create_proposal_payment_entry", proposal, DocType::PaymentEntry, "PAY").await
        }

        async fn submit_payment_entry(
            &self,
            payment_entry: &str,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ArtifactRef, PortError> {
            self.calls
                .lock()
                .await
                .push(("submit_payment_entry".to_string(), payment_entry.to_string()));
            if let Some(message) = self.failures.get("submit_payment_entry") {
                return Err(PortError::internal(message.clone()));
            }
            Ok(ArtifactRef::new(DocType::PaymentEntry, payment_entry))
        }

        async fn create_policy_from_proposal(
            &self,
            proposal: &str,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ArtifactRef, PortError> {
            self.answer("create_policy_from_proposal", proposal, DocType::Policy, "POL").await
        }

        async fn record_policy_payment(
            &self,
            policy: &str,
            _payment: &PolicyPayment,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ArtifactRef, PortError> {
            self.answer("record_policy_payment", policy, DocType::PaymentEntry, "PAY").await
        }

        async fn create_settlement_journal_entry(
            &self,
            claim: &str,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ArtifactRef, PortError> {
            self.answer("create_settlement_journal_entry", claim, DocType::JournalEntry, "JE").await
        }
    }
}
