//! Ports and Adapters Infrastructure
//!
//! This module provides the foundational types for the hexagonal
//! architecture used across the workspace.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Application Layer                        │
//! │          (WorkflowService, VerificationService)              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Port Traits                             │
//! │   DocumentStore, ServerProcedures, RcRegistryPort            │
//! └─────────────────────────────────────────────────────────────┘
//!                    ▲                         ▲
//!                    │                         │
//!         ┌─────────┴─────────┐     ┌────────┴────────┐
//!         │  Internal Adapter │     │ External Adapter │
//!         │ (PostgreSQL, mem) │     │ (RC registry API)│
//!         └───────────────────┘     └──────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::document::{DocType, Document, DocumentQuery, FieldMap, Precondition};

/// Failure reported by any port adapter
///
/// Store, procedure and registry adapters all speak this taxonomy so the
/// services can decide between "retry later", "reload and retry" and
/// "tell the user" without knowing which adapter failed.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// A write precondition no longer holds
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// Credentials were refused by an upstream system
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
    },

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        retry_after_secs: u64,
    },

    /// Upstream is down, or its circuit breaker is open
    #[error("Service unavailable: {service}")]
    ServiceUnavailable {
        service: String,
    },

    /// An upstream payload could not be mapped onto a document
    #[error("Transformation error: {message}")]
    Transformation {
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Validation failure attributed to one document field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Whether a later attempt at the same call could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. }
                | PortError::Timeout { .. }
                | PortError::RateLimited { .. }
                | PortError::ServiceUnavailable { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Whether a conditional write lost against a concurrent change
    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Bound shared by every port trait
pub trait DomainPort: Send + Sync + 'static {}

/// Trip settings for adapters that call external systems
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before a trial call
    pub reset_timeout_secs: u64,
    /// Trial successes needed to close it again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_secs: 30,
            success_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    /// Reachable but refusing some work, e.g. an open circuit
    Degraded,
    Unhealthy,
}

/// Outcome of one adapter health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

/// Who started an operation, and under which request
///
/// Services stamp the principal into `owner` and audit fields; the
/// correlation id ties adapter logs back to the HTTP request.
#[derive(Debug, Clone, Default)]
pub struct OperationMetadata {
    pub correlation_id: Option<String>,
    pub initiated_by: Option<String>,
}

impl OperationMetadata {
    pub fn initiated_by(principal: impl Into<String>) -> Self {
        Self {
            initiated_by: Some(principal.into()),
            ..Default::default()
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// The initiating principal, or "system" for background work
    pub fn actor(&self) -> &str {
        self.initiated_by.as_deref().unwrap_or("system")
    }
}

/// The document/record store every domain reads from and writes to
///
/// Writes that depend on previously read state must be expressed with
/// preconditions. An adapter evaluates the preconditions and applies the
/// update atomically; if any precondition fails it returns
/// `PortError::Conflict` and leaves the document untouched.
#[async_trait]
pub trait DocumentStore: DomainPort + HealthCheckable {
    /// Retrieves a document, or `PortError::NotFound`
    async fn get(&self, doctype: DocType, name: &str) -> Result<Document, PortError>;

    /// Inserts a new document at version 1
    ///
    /// Returns `PortError::Conflict` if a document with the same name exists.
    async fn insert(
        &self,
        doctype: DocType,
        name: &str,
        fields: FieldMap,
    ) -> Result<Document, PortError>;

    /// Merges `updates` into the document iff every precondition holds
    async fn set_fields_if(
        &self,
        doctype: DocType,
        name: &str,
        preconditions: &[Precondition],
        updates: FieldMap,
    ) -> Result<Document, PortError>;

    /// Lists documents matching the query, most recently modified first
    async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, PortError>;
}
