//! Vehicle domain services
//!
//! `VerificationService` runs a registry lookup for a stored vehicle and
//! persists the mapped result. The write is conditional on the vehicle
//! version read before the lookup, so an edit made while the registry was
//! answering is never overwritten.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use core_kernel::{DocType, Document, DocumentStore, FieldMap, OperationMetadata, PortError, Precondition};

use crate::error::VehicleError;
use crate::ports::RcRegistryPort;
use crate::vehicle::Vehicle;
use crate::verification::{Guidance, VerificationOutcome};

/// Default upper bound for one registry lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// What a verification attempt produced
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub vehicle_name: String,
    pub outcome: VerificationOutcome,
    pub guidance: Guidance,
    /// The vehicle after the outcome was applied
    pub vehicle: Vehicle,
}

impl VerificationReport {
    pub fn message(&self) -> String {
        match &self.outcome {
            VerificationOutcome::Error { message, .. } => message.clone(),
            other => other.guidance().message().to_string(),
        }
    }
}

/// Service verifying vehicles against the RC registry
pub struct VerificationService {
    store: Arc<dyn DocumentStore>,
    registry: Arc<dyn RcRegistryPort>,
    timeout: Duration,
}

impl VerificationService {
    pub fn new(store: Arc<dyn DocumentStore>, registry: Arc<dyn RcRegistryPort>) -> Self {
        Self {
            store,
            registry,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Sets the lookup time limit
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn load(&self, name: &str) -> Result<(Document, Vehicle), VehicleError> {
        let doc = self.store.get(DocType::Vehicle, name).await?;
        let vehicle = doc.decode::<Vehicle>()?;
        Ok((doc, vehicle))
    }

    /// Loads a vehicle by name
    pub async fn get_vehicle(&self, name: &str) -> Result<Vehicle, VehicleError> {
        Ok(self.load(name).await?.1)
    }

    /// Verifies the vehicle's registration number with the registry
    ///
    /// # Errors
    ///
    /// - `VehicleError::Validation` if the vehicle has no registration number;
    ///   the registry is not called
    /// - `VehicleError::Integration` if the registry could not be reached;
    ///   the vehicle is left untouched
    /// - `VehicleError::Conflict` if the vehicle changed during the lookup
    #[instrument(skip(self, metadata), fields(vehicle = %name))]
    pub async fn verify(
        &self,
        name: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<VerificationReport, VehicleError> {
        let (doc, vehicle) = self.load(name).await?;
        let registration_no = vehicle
            .registration()
            .ok_or_else(|| VehicleError::validation("Please enter Registration No first."))?
            .to_string();

        let outcome = match tokio::time::timeout(
            self.timeout,
            self.registry.lookup(&registration_no, metadata),
        )
        .await
        {
            Err(_) | Ok(Err(PortError::Timeout { .. })) => VerificationOutcome::Timeout,
            Ok(Err(e)) => {
                warn!(error = %e, "RC registry call failed");
                return Err(VehicleError::Integration(e.to_string()));
            }
            Ok(Ok(outcome)) => outcome,
        };

        let vehicle = match outcome.patch() {
            None => {
                info!(%registration_no, "RC lookup timed out, vehicle unchanged");
                vehicle
            }
            Some(patch) => {
                let updated = self
                    .store
                    .set_fields_if(DocType::Vehicle, name, &[Precondition::version(doc.version)], patch)
                    .await?;
                info!(%registration_no, verified = outcome.is_success(), "RC verification recorded");
                updated.decode::<Vehicle>()?
            }
        };

        Ok(VerificationReport {
            vehicle_name: name.to_string(),
            guidance: outcome.guidance(),
            outcome,
            vehicle,
        })
    }

    /// Applies a user edit to a vehicle
    ///
    /// Verified fields are read-only unless `roles` holds the override role.
    /// The merged record must still decode as a vehicle.
    #[instrument(skip(self, updates, roles), fields(vehicle = %name))]
    pub async fn update_fields(
        &self,
        name: &str,
        updates: FieldMap,
        roles: &[String],
    ) -> Result<Vehicle, VehicleError> {
        let (doc, vehicle) = self.load(name).await?;
        vehicle.ensure_editable(&doc.fields, &updates, roles)?;

        let mut merged = doc.fields.clone();
        for (key, value) in &updates {
            merged.insert(key.clone(), value.clone());
        }
        serde_json::from_value::<Vehicle>(Value::Object(merged))
            .map_err(|e| VehicleError::validation(format!("Invalid vehicle fields: {}", e)))?;

        let updated = self
            .store
            .set_fields_if(DocType::Vehicle, name, &[Precondition::version(doc.version)], updates)
            .await?;
        Ok(updated.decode::<Vehicle>()?)
    }
}
