//! Payment entry handlers

use axum::{extract::{Path, State}, Json};

use domain_workflow::Action;

use crate::dto::ArtifactResponse;
use crate::handlers::Caller;
use crate::{error::ApiError, AppState};

/// Submits a draft payment entry
pub async fn submit(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
) -> Result<Json<ArtifactResponse>, ApiError> {
    caller.authorize(Action::RecordPayment)?;
    let entry = state.workflow.submit_payment(&name, caller.metadata()).await?;
    let message = format!("Payment Entry {} submitted", entry.name);
    Ok(Json(ArtifactResponse::new(entry, message)))
}
