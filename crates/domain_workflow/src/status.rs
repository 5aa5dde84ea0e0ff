//! Status vocabularies
//!
//! Each entity type has its own set of status labels. Labels are stored
//! verbatim in the `status` field of the document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WorkflowError;

/// Proposal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    Draft,
    Submitted,
    #[serde(rename = "Under Review")]
    UnderReview,
    Approved,
    Rejected,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 5] = [
        ProposalStatus::Draft,
        ProposalStatus::Submitted,
        ProposalStatus::UnderReview,
        ProposalStatus::Approved,
        ProposalStatus::Rejected,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProposalStatus::Draft => "Draft",
            ProposalStatus::Submitted => "Submitted",
            ProposalStatus::UnderReview => "Under Review",
            ProposalStatus::Approved => "Approved",
            ProposalStatus::Rejected => "Rejected",
        }
    }
}

/// Policy status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyStatus {
    /// Issued, premium not yet fully paid
    #[serde(rename = "Pending Payment")]
    PendingPayment,
    Active,
    Expired,
    Cancelled,
}

impl PolicyStatus {
    pub const ALL: [PolicyStatus; 4] = [
        PolicyStatus::PendingPayment,
        PolicyStatus::Active,
        PolicyStatus::Expired,
        PolicyStatus::Cancelled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PolicyStatus::PendingPayment => "Pending Payment",
            PolicyStatus::Active => "Active",
            PolicyStatus::Expired => "Expired",
            PolicyStatus::Cancelled => "Cancelled",
        }
    }
}

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    Reported,
    #[serde(rename = "Survey Assigned", alias = "Surveyor Appointed")]
    SurveyAssigned,
    #[serde(rename = "Survey Completed")]
    SurveyCompleted,
    Approved,
    Rejected,
    Settled,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 6] = [
        ClaimStatus::Reported,
        ClaimStatus::SurveyAssigned,
        ClaimStatus::SurveyCompleted,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
        ClaimStatus::Settled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ClaimStatus::Reported => "Reported",
            ClaimStatus::SurveyAssigned => "Survey Assigned",
            ClaimStatus::SurveyCompleted => "Survey Completed",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::Settled => "Settled",
        }
    }

    /// Returns true for statuses a claim never leaves
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Settled | ClaimStatus::Rejected)
    }

    /// Checks if the claim may move directly to `target`
    pub fn can_advance_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, target),
            (Reported, SurveyAssigned)
                | (SurveyAssigned, SurveyCompleted)
                | (SurveyCompleted, Approved)
                | (SurveyCompleted, Rejected)
                | (Approved, Settled)
        )
    }
}

macro_rules! status_text {
    ($status:ident, $kind:literal, { $($alias:literal => $variant:ident),* }) => {
        impl fmt::Display for $status {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $status {
            type Err = WorkflowError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed == $alias {
                        return Ok($status::$variant);
                    }
                )*
                Self::ALL
                    .into_iter()
                    .find(|status| status.label() == trimmed)
                    .ok_or_else(|| WorkflowError::InvalidDocument(format!("Unknown {} status: {}", $kind, s)))
            }
        }
    };
}

status_text!(ProposalStatus, "proposal", {});
status_text!(PolicyStatus, "policy", {});
status_text!(ClaimStatus, "claim", { "Surveyor Appointed" => SurveyAssigned });
