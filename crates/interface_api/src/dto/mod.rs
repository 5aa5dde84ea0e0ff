//! Request and response bodies

pub mod common;
pub mod proposals;
pub mod policies;
pub mod claims;
pub mod vehicles;
pub mod plans;

pub use common::{ActionsResponse, ArtifactResponse, DocumentResponse};
