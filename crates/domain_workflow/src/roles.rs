//! Role requirements for workflow transitions
//!
//! The gate decides what a document allows; this table decides who may
//! take it. A principal holding any of the listed roles may run the
//! action. Administrators may run every action.

use crate::action::Action;
use crate::error::WorkflowError;
use crate::status::ClaimStatus;

pub const SYSTEM_MANAGER: &str = "System Manager";
pub const INSURANCE_SYSTEM_ADMIN: &str = "Insurance System Admin";
pub const INSURANCE_AGENT: &str = "Insurance Agent";
pub const INSURANCE_UNDERWRITER: &str = "Insurance Underwriter";
pub const CLAIMS_OFFICER: &str = "Claims Officer";
pub const SURVEYOR: &str = "Surveyor";
pub const FINANCE_AND_ACCOUNTS: &str = "Finance & Accounts";
pub const INSURANCE_CUSTOMER: &str = "Insurance Customer";

const ADMIN_ROLES: [&str; 2] = [SYSTEM_MANAGER, INSURANCE_SYSTEM_ADMIN];

/// Roles that may run `action`
pub fn required_roles(action: Action) -> &'static [&'static str] {
    match action {
        Action::SubmitForReview => &[INSURANCE_AGENT],
        Action::Approve | Action::Reject => &[INSURANCE_UNDERWRITER],
        Action::RecordPayment => &[INSURANCE_AGENT, FINANCE_AND_ACCOUNTS],
        Action::ConvertToPolicy => &[INSURANCE_AGENT, INSURANCE_UNDERWRITER],
        Action::CreateClaim => &[INSURANCE_AGENT, CLAIMS_OFFICER, INSURANCE_CUSTOMER],
        Action::CancelPolicy => &[INSURANCE_UNDERWRITER],
        Action::CreateSettlement => &[FINANCE_AND_ACCOUNTS],
        Action::AssignSurveyor => &[CLAIMS_OFFICER],
    }
}

/// Roles that may move a claim to `target`
pub fn claim_advance_roles(target: ClaimStatus) -> &'static [&'static str] {
    match target {
        ClaimStatus::Reported => &[],
        ClaimStatus::SurveyAssigned => &[CLAIMS_OFFICER],
        ClaimStatus::SurveyCompleted => &[SURVEYOR],
        ClaimStatus::Approved | ClaimStatus::Rejected => &[CLAIMS_OFFICER],
        ClaimStatus::Settled => &[FINANCE_AND_ACCOUNTS],
    }
}

fn permits(allowed: &[&str], roles: &[String]) -> bool {
    roles
        .iter()
        .any(|role| ADMIN_ROLES.contains(&role.as_str()) || allowed.contains(&role.as_str()))
}

fn forbidden(action: String, allowed: &[&str]) -> WorkflowError {
    WorkflowError::Forbidden {
        action,
        roles: if allowed.is_empty() {
            "administrators".to_string()
        } else {
            allowed.join(" or ")
        },
    }
}

/// Checks that a principal holding `roles` may run `action`
///
/// # Errors
///
/// Returns `WorkflowError::Forbidden` naming the roles that would be accepted
pub fn authorize(action: Action, roles: &[String]) -> Result<(), WorkflowError> {
    let allowed = required_roles(action);
    if permits(allowed, roles) {
        Ok(())
    } else {
        Err(forbidden(action.label().to_string(), allowed))
    }
}

/// Checks that a principal holding `roles` may move a claim to `target`
pub fn authorize_claim_advance(target: ClaimStatus, roles: &[String]) -> Result<(), WorkflowError> {
    let allowed = claim_advance_roles(target);
    if permits(allowed, roles) {
        Ok(())
    } else {
        Err(forbidden(format!("Move to {}", target), allowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_underwriter_decides_proposals() {
        assert!(authorize(Action::Approve, &roles(&[INSURANCE_UNDERWRITER])).is_ok());
        assert!(authorize(Action::Reject, &roles(&[INSURANCE_UNDERWRITER])).is_ok());

        let err = authorize(Action::Approve, &roles(&[INSURANCE_AGENT])).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden { .. }));
        assert_eq!(
            err.to_string(),
            "Action 'Approve' is restricted to Insurance Underwriter"
        );
    }

    #[test]
    fn test_administrators_may_run_everything() {
        for admin in ADMIN_ROLES {
            for action in Action::ALL {
                assert!(authorize(action, &roles(&[admin])).is_ok());
            }
            for target in ClaimStatus::ALL {
                assert!(authorize_claim_advance(target, &roles(&[admin])).is_ok());
            }
        }
    }

    #[test]
    fn test_every_action_has_a_role() {
        for action in Action::ALL {
            assert!(!required_roles(action).is_empty(), "{} has no role", action);
        }
    }

    #[test]
    fn test_claim_steps_follow_duties() {
        assert!(authorize_claim_advance(ClaimStatus::SurveyCompleted, &roles(&[SURVEYOR])).is_ok());
        assert!(authorize_claim_advance(ClaimStatus::Approved, &roles(&[SURVEYOR])).is_err());
        assert!(authorize_claim_advance(ClaimStatus::Rejected, &roles(&[CLAIMS_OFFICER])).is_ok());

        let err = authorize_claim_advance(ClaimStatus::Reported, &roles(&[CLAIMS_OFFICER])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Action 'Move to Reported' is restricted to administrators"
        );
    }

    #[test]
    fn test_no_roles_no_actions() {
        for action in Action::ALL {
            assert!(authorize(action, &[]).is_err());
        }
    }

    #[test]
    fn test_any_listed_role_suffices() {
        let finance = roles(&["Employee", FINANCE_AND_ACCOUNTS]);
        assert!(authorize(Action::RecordPayment, &finance).is_ok());
        assert!(authorize(Action::CreateSettlement, &finance).is_ok());
        assert!(authorize(Action::AssignSurveyor, &finance).is_err());
    }
}
