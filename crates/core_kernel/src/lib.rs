//! Core Kernel - Foundational types for the motor insurance workflow core
//!
//! This crate provides the building blocks shared by every domain crate:
//! - The document model and the `DocumentStore` port with conditional writes
//! - Port error taxonomy, adapter health checks and operation metadata
//! - A circuit breaker for adapters that call external systems
//! - Coverage periods for date-of-loss checks
//! - Typed document names

pub mod document;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod resilience;
pub mod error;

pub use document::{DocType, DocStatus, Document, DocumentQuery, Precondition, FieldMap};
pub use temporal::{CoveragePeriod, TemporalError};
pub use identifiers::{
    ProposalName, PolicyName, ClaimName, VehicleName,
    PaymentEntryName, JournalEntryName,
};
pub use ports::{
    PortError, DomainPort, DocumentStore, HealthCheckable, HealthCheckResult,
    AdapterHealth, CircuitBreakerConfig, OperationMetadata,
};
pub use resilience::{CircuitBreaker, CircuitState};
pub use error::CoreError;
