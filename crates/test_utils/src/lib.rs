//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! motor workflow test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed dates, registry payloads and seeded stores
//! - `builders`: Builders for proposal, policy, claim, vehicle, plan and payment documents
//! - `database`: PostgreSQL test container management
//! - `assertions`: Assertion helpers for documents and port errors
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
