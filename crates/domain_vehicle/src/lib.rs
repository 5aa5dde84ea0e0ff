//! Vehicle Domain
//!
//! This crate owns the vehicle record and its verification against the
//! external registration-certificate (RC) registry.
//!
//! # Verification Flow
//!
//! ```text
//! registration_no -> RcRegistryPort::lookup (bounded) -> VerificationOutcome
//!                 -> field patch -> DocumentStore::set_fields_if(version)
//! ```
//!
//! After a successful verification the identifying fields of the vehicle are
//! locked for everyone except the administrative override role.

pub mod vehicle;
pub mod fuel;
pub mod verification;
pub mod error;
pub mod ports;
pub mod adapters;
pub mod services;

pub use vehicle::{
    Vehicle, has_override_role, ADMIN_OVERRIDE_ROLE, LOCKED_FIELDS, VERIFICATION_FIELDS,
    RC_STATUS_ACTIVE,
};
pub use fuel::FuelType;
pub use verification::{Guidance, RcDetails, VerificationOutcome};
pub use error::VehicleError;
pub use ports::RcRegistryPort;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockRcRegistry;
pub use adapters::{RcRegistryAdapter, RcRegistryConfig, RegistryEnvironment};
pub use services::{VerificationReport, VerificationService, DEFAULT_LOOKUP_TIMEOUT};
