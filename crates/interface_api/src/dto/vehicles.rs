//! Vehicle DTOs

use serde::Serialize;

use domain_vehicle::{Guidance, Vehicle, VerificationOutcome, VerificationReport};

#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub vehicle_name: String,
    pub message: String,
    pub guidance: Guidance,
    pub outcome: VerificationOutcome,
    pub vehicle: Vehicle,
}

impl From<VerificationReport> for VerificationResponse {
    fn from(report: VerificationReport) -> Self {
        Self {
            message: report.message(),
            vehicle_name: report.vehicle_name,
            guidance: report.guidance,
            outcome: report.outcome,
            vehicle: report.vehicle,
        }
    }
}
