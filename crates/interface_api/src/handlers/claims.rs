//! Claim handlers

use axum::{extract::{Path, State}, Json};

use core_kernel::DocType;
use domain_workflow::{Action, ClaimStatus};

use crate::dto::claims::{AdvanceClaimRequest, SurveyAssignmentRequest, SurveyAssignmentResponse};
use crate::dto::{ActionsResponse, ArtifactResponse, DocumentResponse};
use crate::handlers::{validated, Caller};
use crate::{error::ApiError, AppState};

pub async fn actions(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActionsResponse>, ApiError> {
    let actions = state.workflow.available_actions(DocType::Claim, &name).await?;
    Ok(Json(ActionsResponse {
        doctype: DocType::Claim,
        name,
        actions,
    }))
}

/// Moves the selected Reported claims to survey
pub async fn assign_surveyor(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<SurveyAssignmentRequest>,
) -> Result<Json<SurveyAssignmentResponse>, ApiError> {
    caller.authorize(Action::AssignSurveyor)?;
    let request = validated(request)?;
    let report = state
        .workflow
        .assign_surveyor(&request.claims, &request.surveyor, request.survey_date, caller.metadata())
        .await?;
    Ok(Json(report.into()))
}

pub async fn create_settlement(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
) -> Result<Json<ArtifactResponse>, ApiError> {
    caller.authorize(Action::CreateSettlement)?;
    let entry = state.workflow.create_settlement(&name, caller.metadata()).await?;
    let message = format!("Settlement Journal Entry {} created", entry.name);
    Ok(Json(ArtifactResponse::new(entry, message)))
}

pub async fn advance(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
    Json(request): Json<AdvanceClaimRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let target: ClaimStatus = request
        .status
        .parse()
        .map_err(|e: domain_workflow::WorkflowError| ApiError::Validation(e.to_string(), None))?;
    caller.authorize_claim_advance(target)?;
    let doc = state
        .workflow
        .advance_claim(&name, target, request.approved_amount, caller.metadata())
        .await?;
    Ok(Json(doc.into()))
}
