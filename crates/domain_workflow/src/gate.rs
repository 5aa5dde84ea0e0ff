//! The workflow gate
//!
//! `gate` maps an entity snapshot to the ordered list of actions currently
//! available for it. It is a pure function: it performs no transition and
//! reads nothing beyond the snapshot. Anything it does not list is denied.

use rust_decimal::Decimal;

use crate::action::{Action, ActionDescriptor};
use crate::error::WorkflowError;
use crate::state::{ClaimState, PolicyState, ProposalState, Subject};
use crate::status::{ClaimStatus, PolicyStatus, ProposalStatus};

/// Returns the actions available for `subject`, in presentation order
pub fn gate(subject: &Subject) -> Vec<ActionDescriptor> {
    match subject {
        Subject::Proposal(state) => proposal_actions(state),
        Subject::Policy(state) => policy_actions(state),
        Subject::Claim(state) => claim_actions(state),
    }
}

fn proposal_actions(state: &ProposalState) -> Vec<ActionDescriptor> {
    let mut actions = Vec::new();

    match state.status {
        ProposalStatus::Draft | ProposalStatus::Submitted => {
            actions.push(
                ActionDescriptor::new(Action::SubmitForReview)
                    .to_status(ProposalStatus::UnderReview.label()),
            );
        }
        ProposalStatus::UnderReview => {
            actions.push(ActionDescriptor::new(Action::Approve).to_status(ProposalStatus::Approved.label()));
            actions.push(
                ActionDescriptor::new(Action::Reject)
                    .to_status(ProposalStatus::Rejected.label())
                    .with_reason(),
            );
        }
        ProposalStatus::Approved if state.docstatus.is_submitted() && state.policy.is_none() => {
            if state.has_submitted_payment {
                actions.push(ActionDescriptor::new(Action::ConvertToPolicy));
            } else {
                actions.push(ActionDescriptor::new(Action::RecordPayment));
            }
        }
        _ => {}
    }

    actions
}

fn policy_actions(state: &PolicyState) -> Vec<ActionDescriptor> {
    let mut actions = Vec::new();

    if state.outstanding_amount > Decimal::ZERO {
        actions.push(ActionDescriptor::new(Action::RecordPayment).confirmed());
    }

    let in_force = state.docstatus.is_submitted()
        || matches!(state.status, PolicyStatus::Active | PolicyStatus::Expired);
    if state.status != PolicyStatus::Cancelled && in_force {
        actions.push(ActionDescriptor::new(Action::CreateClaim));
    }

    if !matches!(state.status, PolicyStatus::Cancelled | PolicyStatus::Expired) {
        actions.push(
            ActionDescriptor::new(Action::CancelPolicy)
                .to_status(PolicyStatus::Cancelled.label())
                .confirmed(),
        );
    }

    actions
}

fn claim_actions(state: &ClaimState) -> Vec<ActionDescriptor> {
    match state.status {
        ClaimStatus::Approved if state.settlement_journal_entry.is_none() => {
            vec![ActionDescriptor::new(Action::CreateSettlement)]
        }
        ClaimStatus::Reported => vec![ActionDescriptor::new(Action::AssignSurveyor)
            .to_status(ClaimStatus::SurveyAssigned.label())
            .bulk()],
        _ => Vec::new(),
    }
}

/// Returns true if the gate currently offers `action`
pub fn is_permitted(subject: &Subject, action: Action) -> bool {
    gate(subject).iter().any(|d| d.action == action)
}

/// Returns the descriptor for `action`, or `ActionNotPermitted`
pub fn require(subject: &Subject, action: Action) -> Result<ActionDescriptor, WorkflowError> {
    gate(subject)
        .into_iter()
        .find(|d| d.action == action)
        .ok_or_else(|| WorkflowError::ActionNotPermitted {
            action: action.label().to_string(),
            entity: subject.doctype().to_string(),
            status: subject.status_label().to_string(),
        })
}
