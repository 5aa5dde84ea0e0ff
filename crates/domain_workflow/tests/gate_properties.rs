//! Property tests for the gate and input validation
//!
//! `expected_actions` restates the gating table row by row from the raw
//! stored fields, without going through the snapshot types, and the gate
//! must agree with it for every generated document.

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use core_kernel::{DocStatus, DocType, Document};
use domain_workflow::{
    gate, is_permitted, require, validate_date_of_loss, validate_reason, Action, ActionDescriptor,
    ActionScope, ClaimState, ClaimStatus, PolicyState, ProposalState, Subject, WorkflowError,
};
use test_utils::{
    blank_strategy, claim_status_label_strategy, docstatus_strategy, fields,
    outstanding_strategy, period_and_date_strategy, policy_status_label_strategy,
    proposal_status_label_strategy, reason_strategy,
};

/// Stored fields of one generated document
#[derive(Debug, Clone)]
enum Stored {
    Proposal {
        status: &'static str,
        docstatus: DocStatus,
        paid: bool,
        policy: Option<String>,
    },
    Policy {
        status: &'static str,
        docstatus: DocStatus,
        outstanding: Decimal,
    },
    Claim {
        status: &'static str,
        settlement_entry: Option<String>,
    },
}

fn stored_strategy() -> impl Strategy<Value = Stored> {
    prop_oneof![
        (
            proposal_status_label_strategy(),
            docstatus_strategy(),
            any::<bool>(),
            proptest::option::of("POL-[0-9]{4}"),
        )
            .prop_map(|(status, docstatus, paid, policy)| Stored::Proposal {
                status,
                docstatus,
                paid,
                policy,
            }),
        (policy_status_label_strategy(), docstatus_strategy(), outstanding_strategy()).prop_map(
            |(status, docstatus, outstanding)| Stored::Policy {
                status,
                docstatus,
                outstanding,
            }
        ),
        (claim_status_label_strategy(), proptest::option::of("JE-[0-9]{4}")).prop_map(
            |(status, settlement_entry)| Stored::Claim {
                status,
                settlement_entry,
            }
        ),
    ]
}

/// Reads the stored fields the way an executor would
fn snapshot(stored: &Stored) -> Result<Subject, WorkflowError> {
    match stored {
        Stored::Proposal {
            status,
            docstatus,
            paid,
            policy,
        } => {
            let doc = Document::new(
                DocType::Proposal,
                "PROP-1",
                fields(json!({"status": status, "docstatus": docstatus, "policy": policy})),
            );
            ProposalState::from_document(&doc, *paid).map(Subject::Proposal)
        }
        Stored::Policy {
            status,
            docstatus,
            outstanding,
        } => {
            let doc = Document::new(
                DocType::Policy,
                "POL-1",
                fields(json!({
                    "status": status,
                    "docstatus": docstatus,
                    "outstanding_amount": outstanding.to_string(),
                })),
            );
            PolicyState::from_document(&doc).map(Subject::Policy)
        }
        Stored::Claim {
            status,
            settlement_entry,
        } => {
            let doc = Document::new(
                DocType::Claim,
                "CLM-1",
                fields(json!({"status": status, "settlement_journal_entry": settlement_entry})),
            );
            ClaimState::from_document(&doc).map(Subject::Claim)
        }
    }
}

/// Actions the gating table lists, or `None` for an unknown status label
fn expected_actions(stored: &Stored) -> Option<Vec<Action>> {
    match stored {
        Stored::Proposal {
            status,
            docstatus,
            paid,
            policy,
        } => match *status {
            "Draft" | "Submitted" => Some(vec![Action::SubmitForReview]),
            "Under Review" => Some(vec![Action::Approve, Action::Reject]),
            "Approved" if *docstatus == DocStatus::Submitted && policy.is_none() => {
                if *paid {
                    Some(vec![Action::ConvertToPolicy])
                } else {
                    Some(vec![Action::RecordPayment])
                }
            }
            "Approved" | "Rejected" => Some(vec![]),
            _ => None,
        },
        Stored::Policy {
            status,
            docstatus,
            outstanding,
        } => {
            if !["Pending Payment", "Active", "Expired", "Cancelled"].contains(status) {
                return None;
            }
            let mut actions = Vec::new();
            if *outstanding > Decimal::ZERO {
                actions.push(Action::RecordPayment);
            }
            let in_force = *docstatus == DocStatus::Submitted || *status == "Active" || *status == "Expired";
            if *status != "Cancelled" && in_force {
                actions.push(Action::CreateClaim);
            }
            if *status != "Cancelled" && *status != "Expired" {
                actions.push(Action::CancelPolicy);
            }
            Some(actions)
        }
        Stored::Claim {
            status,
            settlement_entry,
        } => match *status {
            "Approved" if settlement_entry.is_none() => Some(vec![Action::CreateSettlement]),
            "Reported" => Some(vec![Action::AssignSurveyor]),
            "Approved" | "Survey Assigned" | "Surveyor Appointed" | "Survey Completed" | "Rejected"
            | "Settled" => Some(vec![]),
            _ => None,
        },
    }
}

/// Presentation flags each table row gives its action
fn check_flags(stored: &Stored, descriptor: &ActionDescriptor) -> Result<(), TestCaseError> {
    let (target, confirmation, reason, scope) = match (stored, descriptor.action) {
        (Stored::Proposal { .. }, Action::SubmitForReview) => (Some("Under Review"), false, false, ActionScope::Single),
        (Stored::Proposal { .. }, Action::Approve) => (Some("Approved"), false, false, ActionScope::Single),
        (Stored::Proposal { .. }, Action::Reject) => (Some("Rejected"), false, true, ActionScope::Single),
        (Stored::Proposal { .. }, _) => (None, false, false, ActionScope::Single),
        (Stored::Policy { .. }, Action::RecordPayment) => (None, true, false, ActionScope::Single),
        (Stored::Policy { .. }, Action::CancelPolicy) => (Some("Cancelled"), true, false, ActionScope::Single),
        (Stored::Policy { .. }, _) => (None, false, false, ActionScope::Single),
        (Stored::Claim { .. }, Action::AssignSurveyor) => (Some("Survey Assigned"), false, false, ActionScope::Bulk),
        (Stored::Claim { .. }, _) => (None, false, false, ActionScope::Single),
    };
    prop_assert_eq!(descriptor.target_status, target);
    prop_assert_eq!(descriptor.requires_confirmation, confirmation);
    prop_assert_eq!(descriptor.requires_reason, reason);
    prop_assert_eq!(descriptor.scope, scope);
    prop_assert_eq!(descriptor.label, descriptor.action.label());
    Ok(())
}

proptest! {
    #[test]
    fn gate_matches_the_gating_table(stored in stored_strategy()) {
        let parsed = snapshot(&stored);
        match expected_actions(&stored) {
            None => {
                let invalid = matches!(parsed, Err(WorkflowError::InvalidDocument(_)));
                prop_assert!(invalid, "unknown status accepted: {:?}", stored);
            }
            Some(expected) => {
                let subject = parsed.expect("known status labels parse");
                let descriptors = gate(&subject);
                let offered: Vec<Action> = descriptors.iter().map(|d| d.action).collect();
                prop_assert_eq!(&offered, &expected, "for {:?}", stored);
                for descriptor in &descriptors {
                    check_flags(&stored, descriptor)?;
                }
            }
        }
    }

    #[test]
    fn require_agrees_with_the_gating_table(stored in stored_strategy()) {
        let Some(expected) = expected_actions(&stored) else { return Ok(()) };
        let subject = snapshot(&stored).expect("known status labels parse");

        for action in Action::ALL {
            let listed = expected.contains(&action);
            prop_assert_eq!(is_permitted(&subject, action), listed);
            match require(&subject, action) {
                Ok(descriptor) => {
                    prop_assert!(listed);
                    prop_assert_eq!(descriptor.action, action);
                }
                Err(WorkflowError::ActionNotPermitted { entity, status, .. }) => {
                    prop_assert!(!listed);
                    prop_assert_eq!(entity, subject.doctype().to_string());
                    prop_assert_eq!(status, subject.status_label().to_string());
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn unknown_labels_never_gate(status in "[A-Z][a-z]{3,10}") {
        prop_assume!(status.parse::<ClaimStatus>().is_err());
        let doc = Document::new(DocType::Claim, "CLM-1", fields(json!({"status": status})));
        prop_assert!(matches!(
            ClaimState::from_document(&doc),
            Err(WorkflowError::InvalidDocument(_))
        ));
    }

    #[test]
    fn loss_date_accepted_iff_inside_cover((period, date) in period_and_date_strategy()) {
        let inside = period.start <= date && date <= period.end;
        prop_assert_eq!(validate_date_of_loss(date, &period).is_ok(), inside);
    }

    #[test]
    fn non_blank_reasons_accepted(reason in reason_strategy()) {
        prop_assert_eq!(validate_reason(Some(reason.as_str())).unwrap(), reason.trim());
    }

    #[test]
    fn blank_reasons_rejected(reason in blank_strategy()) {
        prop_assert!(validate_reason(Some(reason.as_str())).is_err());
    }
}
