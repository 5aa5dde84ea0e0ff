//! Vehicle handlers

use axum::{extract::{Path, State}, Json};

use core_kernel::FieldMap;
use domain_vehicle::Vehicle;

use crate::dto::vehicles::VerificationResponse;
use crate::handlers::Caller;
use crate::{error::ApiError, AppState};

/// Verifies the vehicle's RC with the registry
pub async fn verify_rc(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
) -> Result<Json<VerificationResponse>, ApiError> {
    let report = state.vehicles.verify(&name, caller.metadata()).await?;
    Ok(Json(report.into()))
}

/// Edits vehicle fields; verified fields need the override role
pub async fn update(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
    Json(updates): Json<FieldMap>,
) -> Result<Json<Vehicle>, ApiError> {
    let vehicle = state
        .vehicles
        .update_fields(&name, updates, &caller.claims.roles)
        .await?;
    Ok(Json(vehicle))
}
