//! Actions and their descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every action the workflow can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SubmitForReview,
    Approve,
    Reject,
    RecordPayment,
    ConvertToPolicy,
    CreateClaim,
    CancelPolicy,
    CreateSettlement,
    AssignSurveyor,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::SubmitForReview,
        Action::Approve,
        Action::Reject,
        Action::RecordPayment,
        Action::ConvertToPolicy,
        Action::CreateClaim,
        Action::CancelPolicy,
        Action::CreateSettlement,
        Action::AssignSurveyor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Action::SubmitForReview => "Submit for Review",
            Action::Approve => "Approve",
            Action::Reject => "Reject",
            Action::RecordPayment => "Record Payment",
            Action::ConvertToPolicy => "Convert to Policy",
            Action::CreateClaim => "Create Claim",
            Action::CancelPolicy => "Cancel Policy",
            Action::CreateSettlement => "Create Settlement",
            Action::AssignSurveyor => "Assign Surveyor",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether an action applies to one record or to a list selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionScope {
    Single,
    Bulk,
}

/// An action the gate offers, with what the UI needs to present it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDescriptor {
    pub action: Action,
    pub label: &'static str,
    /// Status the action moves to, for pure transitions
    pub target_status: Option<&'static str>,
    pub requires_confirmation: bool,
    pub requires_reason: bool,
    pub scope: ActionScope,
}

impl ActionDescriptor {
    pub(crate) fn new(action: Action) -> Self {
        Self {
            action,
            label: action.label(),
            target_status: None,
            requires_confirmation: false,
            requires_reason: false,
            scope: ActionScope::Single,
        }
    }

    pub(crate) fn to_status(mut self, status: &'static str) -> Self {
        self.target_status = Some(status);
        self
    }

    pub(crate) fn confirmed(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    pub(crate) fn with_reason(mut self) -> Self {
        self.requires_reason = true;
        self
    }

    pub(crate) fn bulk(mut self) -> Self {
        self.scope = ActionScope::Bulk;
        self
    }
}
