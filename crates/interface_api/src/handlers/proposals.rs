//! Proposal handlers

use axum::{extract::{Path, State}, Json};
use chrono::Utc;

use core_kernel::DocType;
use domain_workflow::Action;

use crate::dto::proposals::RejectRequest;
use crate::dto::{ActionsResponse, ArtifactResponse, DocumentResponse};
use crate::handlers::{validated, Caller};
use crate::{error::ApiError, AppState};

/// Lists the actions available for a proposal
pub async fn actions(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActionsResponse>, ApiError> {
    let actions = state.workflow.available_actions(DocType::Proposal, &name).await?;
    Ok(Json(ActionsResponse {
        doctype: DocType::Proposal,
        name,
        actions,
    }))
}

pub async fn submit_for_review(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
) -> Result<Json<DocumentResponse>, ApiError> {
    caller.authorize(Action::SubmitForReview)?;
    let today = Utc::now().date_naive();
    let doc = state
        .workflow
        .submit_for_review(&name, today, caller.metadata())
        .await?;
    Ok(Json(doc.into()))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
) -> Result<Json<DocumentResponse>, ApiError> {
    caller.authorize(Action::Approve)?;
    let doc = state.workflow.approve(&name, caller.metadata()).await?;
    Ok(Json(doc.into()))
}

pub async fn reject(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
    Json(request): Json<RejectRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    caller.authorize(Action::Reject)?;
    let request = validated(request)?;
    let doc = state
        .workflow
        .reject(&name, request.reason.as_deref(), caller.metadata())
        .await?;
    Ok(Json(doc.into()))
}

/// Creates the draft premium payment entry
pub async fn record_payment(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
) -> Result<Json<ArtifactResponse>, ApiError> {
    caller.authorize(Action::RecordPayment)?;
    let entry = state.workflow.record_payment(&name, caller.metadata()).await?;
    let message = format!("Payment Entry {} created. Submit it to continue.", entry.name);
    Ok(Json(ArtifactResponse::new(entry, message)))
}

pub async fn convert_to_policy(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
) -> Result<Json<ArtifactResponse>, ApiError> {
    caller.authorize(Action::ConvertToPolicy)?;
    let policy = state.workflow.convert_to_policy(&name, caller.metadata()).await?;
    let message = format!("Policy {} created successfully", policy.name);
    Ok(Json(ArtifactResponse::new(policy, message)))
}
