//! Policy handlers

use axum::{extract::{Path, State}, http::StatusCode, Json};

use core_kernel::DocType;
use domain_workflow::{Action, ClaimIntake, PolicyPayment};

use crate::dto::policies::{CreateClaimRequest, PolicyPaymentRequest};
use crate::dto::{ActionsResponse, ArtifactResponse, DocumentResponse};
use crate::handlers::{validated, Caller};
use crate::{error::ApiError, AppState};

pub async fn actions(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActionsResponse>, ApiError> {
    let actions = state.workflow.available_actions(DocType::Policy, &name).await?;
    Ok(Json(ActionsResponse {
        doctype: DocType::Policy,
        name,
        actions,
    }))
}

/// Records and submits a premium payment
pub async fn record_payment(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
    Json(request): Json<PolicyPaymentRequest>,
) -> Result<Json<ArtifactResponse>, ApiError> {
    caller.authorize(Action::RecordPayment)?;
    let payment: PolicyPayment = validated(request)?.into();
    let entry = state
        .workflow
        .record_policy_payment(&name, &payment, caller.metadata())
        .await?;
    let message = format!("Payment {} recorded", entry.name);
    Ok(Json(ArtifactResponse::new(entry, message)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
) -> Result<Json<DocumentResponse>, ApiError> {
    caller.authorize(Action::CancelPolicy)?;
    let doc = state.workflow.cancel_policy(&name, caller.metadata()).await?;
    Ok(Json(doc.into()))
}

/// Reports a claim against the policy
///
/// The date of loss is checked against the policy's cover as it is taken
/// from the request.
pub async fn create_claim(
    State(state): State<AppState>,
    Path(name): Path<String>,
    caller: Caller,
    Json(request): Json<CreateClaimRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    caller.authorize(Action::CreateClaim)?;
    let request = validated(request)?;
    let period = state.workflow.policy_coverage(&name).await?;

    let mut intake = ClaimIntake::new();
    intake.set_date_of_loss(request.date_of_loss, &period)?;
    if let Some(amount) = request.claim_amount {
        intake = intake.with_amount(amount);
    }
    if let Some(description) = request.description {
        intake = intake.with_description(description);
    }

    let claim = state
        .workflow
        .create_claim(&name, &intake, caller.metadata())
        .await?;
    Ok((StatusCode::CREATED, Json(claim.into())))
}
