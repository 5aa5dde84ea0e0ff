//! External Adapters for the Vehicle Domain
//!
//! - **RcRegistryAdapter**: registration-certificate registry over HTTPS
//! - **MockRcRegistry**: scripted registry for tests (re-exported from `ports`)

pub mod rc_registry;

pub use rc_registry::{RcRegistryAdapter, RcRegistryConfig, RegistryEnvironment};
