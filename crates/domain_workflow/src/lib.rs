//! Workflow Domain
//!
//! Status gating and conditional transitions for insurance proposals,
//! policies and claims.
//!
//! # Flow
//!
//! ```text
//! Document --snapshot--> Subject --gate--> [ActionDescriptor]
//!                                   |
//!        WorkflowService executor --+--> set_fields_if([status = read status, ...])
//!                                   \--> ServerProcedures (payments, policy, settlement)
//! ```
//!
//! The gate is deny-by-default: an action that is not listed for the
//! current snapshot is refused with `WorkflowError::ActionNotPermitted`.

pub mod status;
pub mod state;
pub mod action;
pub mod gate;
pub mod validation;
pub mod roles;
pub mod premium;
pub mod error;
pub mod ports;
pub mod procedures;
pub mod services;

pub use status::{ClaimStatus, PolicyStatus, ProposalStatus};
pub use state::{
    date_field, decimal_field, policy_period, text_field, ClaimState, PolicyState, ProposalState,
    Subject,
};
pub use action::{Action, ActionDescriptor, ActionScope};
pub use gate::{gate, is_permitted, require};
pub use validation::{
    append_note, validate_date_of_loss, validate_proposal, validate_reason,
    validate_survey_assignment, validate_waiting_period, ClaimIntake, ClaimLimits, PolicyPayment,
};
pub use premium::{AddonPremium, AddonPricing, InsurancePlan, PlanAddon, PremiumQuote, RateType};
pub use roles::{authorize, authorize_claim_advance, claim_advance_roles, required_roles};
pub use error::WorkflowError;
pub use ports::{ArtifactRef, ServerProcedures};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockServerProcedures;
pub use procedures::StoreProcedures;
pub use services::{AssignmentResult, BulkAssignmentReport, ExcludedClaim, WorkflowService};
