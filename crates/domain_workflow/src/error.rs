//! Workflow domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the workflow domain
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Required input is missing or invalid; nothing was written
    #[error("Validation error: {0}")]
    Validation(String),

    /// The gate does not offer the action in the entity's current state
    #[error("Action '{action}' is not available for {entity} in status {status}")]
    ActionNotPermitted {
        action: String,
        entity: String,
        status: String,
    },

    /// The principal holds none of the roles the action requires
    #[error("Action '{action}' is restricted to {roles}")]
    Forbidden { action: String, roles: String },

    /// A conditional write lost against a concurrent change
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored document could not be interpreted
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A server procedure failed
    #[error("Procedure '{procedure}' failed: {message}")]
    Procedure { procedure: String, message: String },

    /// Store failure
    #[error("Store error: {0}")]
    Port(#[source] PortError),
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        WorkflowError::Conflict(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, WorkflowError::Conflict(_))
    }
}

impl From<PortError> for WorkflowError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => {
                WorkflowError::NotFound(format!("{} {}", entity_type, id))
            }
            PortError::Conflict { message } => WorkflowError::Conflict(message),
            PortError::Validation { message, .. } => WorkflowError::Validation(message),
            PortError::Transformation { message } => WorkflowError::InvalidDocument(message),
            other => WorkflowError::Port(other),
        }
    }
}

impl From<domain_vehicle::VehicleError> for WorkflowError {
    fn from(error: domain_vehicle::VehicleError) -> Self {
        use domain_vehicle::VehicleError;
        match error {
            VehicleError::Validation(message) => WorkflowError::Validation(message),
            VehicleError::NotFound(name) => WorkflowError::NotFound(format!("Vehicle {}", name)),
            VehicleError::Conflict(message) => WorkflowError::Conflict(message),
            VehicleError::InvalidRecord(message) => WorkflowError::InvalidDocument(message),
            VehicleError::Port(e) => WorkflowError::Port(e),
            other => WorkflowError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_conflict_maps_to_conflict() {
        let error: WorkflowError = PortError::conflict("status changed").into();
        assert!(error.is_conflict());
    }

    #[test]
    fn test_not_found_names_entity() {
        let error: WorkflowError = PortError::not_found("Insurance Claim", "CLM-1").into();
        assert_eq!(error.to_string(), "Not found: Insurance Claim CLM-1");
    }

    #[test]
    fn test_unreadable_vehicle_is_an_invalid_document() {
        let error: WorkflowError =
            domain_vehicle::VehicleError::InvalidRecord("VEH-1: registration_no".into()).into();
        assert!(matches!(error, WorkflowError::InvalidDocument(_)));
    }
}
