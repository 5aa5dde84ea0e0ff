//! Vehicle domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the vehicle domain
#[derive(Debug, Error)]
pub enum VehicleError {
    /// Required input is missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A verified field was edited without the override role
    #[error("Field '{field}' is locked after RC verification")]
    FieldLocked { field: String },

    /// Vehicle not found
    #[error("Vehicle not found: {0}")]
    NotFound(String),

    /// The vehicle changed between read and write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The registry could not be reached
    #[error("Registry integration error: {0}")]
    Integration(String),

    /// The stored record cannot be read as a vehicle
    #[error("Invalid vehicle record: {0}")]
    InvalidRecord(String),

    /// Store failure
    #[error("Store error: {0}")]
    Port(#[source] PortError),
}

impl VehicleError {
    pub fn validation(message: impl Into<String>) -> Self {
        VehicleError::Validation(message.into())
    }

    pub fn locked(field: impl Into<String>) -> Self {
        VehicleError::FieldLocked { field: field.into() }
    }
}

impl From<PortError> for VehicleError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { id, .. } => VehicleError::NotFound(id),
            PortError::Conflict { message } => VehicleError::Conflict(message),
            PortError::Validation { message, .. } => VehicleError::Validation(message),
            PortError::Transformation { message } => VehicleError::InvalidRecord(message),
            other => VehicleError::Port(other),
        }
    }
}
