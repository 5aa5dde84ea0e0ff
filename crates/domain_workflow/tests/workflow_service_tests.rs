//! Workflow executors against an in-memory store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::{
    DocStatus, DocType, Document, DocumentQuery, DocumentStore, DomainPort, FieldMap,
    HealthCheckResult, HealthCheckable, PortError, Precondition,
};
use domain_workflow::{
    decimal_field, Action, AssignmentResult, ClaimIntake, ClaimLimits, ClaimStatus, MockServerProcedures,
    PolicyPayment, ServerProcedures, StoreProcedures, WorkflowError, WorkflowService,
};
use infra_store::InMemoryDocumentStore;
use test_utils::{
    assert_conflict, assert_field_absent, assert_field_eq, assert_unchanged, fields, seeded_store,
    ClaimBuilder, PaymentEntryBuilder, PlanBuilder, PolicyBuilder, ProposalBuilder, TemporalFixtures,
    VehicleBuilder,
};

const PROPOSAL: &str = "PROP-2026-00001";
const POLICY: &str = "POL-2026-00001";
const CLAIM: &str = "CLM-2026-00001";

async fn setup(documents: Vec<Document>) -> (Arc<InMemoryDocumentStore>, WorkflowService) {
    let store = seeded_store(documents).await;
    let procedures = Arc::new(StoreProcedures::new(store.clone()));
    let service = WorkflowService::new(store.clone(), procedures);
    (store, service)
}

fn actions(descriptors: Vec<domain_workflow::ActionDescriptor>) -> Vec<Action> {
    descriptors.into_iter().map(|d| d.action).collect()
}

fn amount(doc: &Document, field: &str) -> Decimal {
    decimal_field(doc, field).unwrap().unwrap_or_default()
}

mod available_actions {
    use super::*;

    #[tokio::test]
    async fn test_payment_decides_next_proposal_action() {
        let (store, service) = setup(vec![ProposalBuilder::new().approved().build()]).await;
        let offered = service.available_actions(DocType::Proposal, PROPOSAL).await.unwrap();
        assert_eq!(actions(offered), vec![Action::RecordPayment]);

        store
            .insert(
                DocType::PaymentEntry,
                "PAY-2026-00001",
                PaymentEntryBuilder::new("PAY-2026-00001", DocType::Proposal, PROPOSAL)
                    .submitted()
                    .build()
                    .fields,
            )
            .await
            .unwrap();

        let offered = service.available_actions(DocType::Proposal, PROPOSAL).await.unwrap();
        assert_eq!(actions(offered), vec![Action::ConvertToPolicy]);
    }

    #[tokio::test]
    async fn test_draft_payment_does_not_unlock_conversion() {
        let (_, service) = setup(vec![
            ProposalBuilder::new().approved().build(),
            PaymentEntryBuilder::new("PAY-2026-00001", DocType::Proposal, PROPOSAL).build(),
        ])
        .await;
        let offered = service.available_actions(DocType::Proposal, PROPOSAL).await.unwrap();
        assert_eq!(actions(offered), vec![Action::RecordPayment]);
    }

    #[tokio::test]
    async fn test_policy_payment_quoting_proposal_does_not_unlock_conversion() {
        let (_, service) = setup(vec![
            ProposalBuilder::new().approved().build(),
            PaymentEntryBuilder::new("PAY-2026-00001", DocType::Policy, POLICY)
                .with_reference_no(PROPOSAL)
                .submitted()
                .build(),
        ])
        .await;
        let offered = service.available_actions(DocType::Proposal, PROPOSAL).await.unwrap();
        assert_eq!(actions(offered), vec![Action::RecordPayment]);

        let err = service.convert_to_policy(PROPOSAL, None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::ActionNotPermitted { .. }));
    }

    #[tokio::test]
    async fn test_unknown_status_is_an_invalid_document() {
        let (_, service) = setup(vec![ClaimBuilder::new().with_status("Withdrawn").build()]).await;
        let err = service.available_actions(DocType::Claim, CLAIM).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidDocument(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_missing_document() {
        let (_, service) = setup(vec![]).await;
        let err = service.available_actions(DocType::Policy, POLICY).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }
}

mod proposals {
    use super::*;

    #[tokio::test]
    async fn test_submit_for_review_requires_insurable_vehicle() {
        let (store, service) = setup(vec![
            ProposalBuilder::new().build(),
            VehicleBuilder::new().build(),
        ])
        .await;
        let before = store.get(DocType::Proposal, PROPOSAL).await.unwrap();

        let err = service
            .submit_for_review(PROPOSAL, TemporalFixtures::today(), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Vehicle RC must be verified"));

        let after = store.get(DocType::Proposal, PROPOSAL).await.unwrap();
        assert_unchanged(&before, &after);
    }

    #[tokio::test]
    async fn test_submit_for_review_moves_to_under_review() {
        let (_, service) = setup(vec![
            ProposalBuilder::new().build(),
            VehicleBuilder::new().verified().build(),
        ])
        .await;

        let updated = service
            .submit_for_review(PROPOSAL, TemporalFixtures::today(), None)
            .await
            .unwrap();
        assert_field_eq(&updated, "status", "Under Review");
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn test_submit_for_review_rejects_incomplete_proposal() {
        let (_, service) = setup(vec![
            ProposalBuilder::new().with_field("vehicle_idv", "0").build(),
            VehicleBuilder::new().verified().build(),
        ])
        .await;
        let err = service
            .submit_for_review(PROPOSAL, TemporalFixtures::today(), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Vehicle IDV must be a positive value");
    }

    #[tokio::test]
    async fn test_approve_outside_review_is_not_permitted() {
        let (store, service) = setup(vec![ProposalBuilder::new().build()]).await;
        let before = store.get(DocType::Proposal, PROPOSAL).await.unwrap();

        let err = service.approve(PROPOSAL, None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::ActionNotPermitted { .. }));
        assert_unchanged(&before, &store.get(DocType::Proposal, PROPOSAL).await.unwrap());
    }

    #[tokio::test]
    async fn test_approve_submits_the_proposal() {
        let (_, service) =
            setup(vec![ProposalBuilder::new().with_status("Under Review").build()]).await;
        let updated = service.approve(PROPOSAL, None).await.unwrap();
        assert_field_eq(&updated, "status", "Approved");
        assert_eq!(updated.docstatus(), DocStatus::Submitted);
    }

    #[tokio::test]
    async fn test_blank_reason_fails_before_reading_the_store() {
        // The proposal does not exist: a store read would report NotFound.
        let (_, service) = setup(vec![]).await;
        for reason in [None, Some(""), Some("   \t\n")] {
            let err = service.reject(PROPOSAL, reason, None).await.unwrap_err();
            assert!(matches!(err, WorkflowError::Validation(_)), "got {:?}", err);
        }
    }

    #[tokio::test]
    async fn test_reject_records_reason_and_appends_note() {
        let (_, service) = setup(vec![ProposalBuilder::new()
            .with_status("Under Review")
            .with_notes("Inspection done on site")
            .build()])
        .await;

        let updated = service
            .reject(PROPOSAL, Some("  Prior accident history not disclosed "), None)
            .await
            .unwrap();
        assert_field_eq(&updated, "status", "Rejected");
        assert_field_eq(&updated, "docstatus", 1);
        assert_field_eq(&updated, "rejection_reason", "Prior accident history not disclosed");
        assert_field_eq(
            &updated,
            "notes",
            "Inspection done on site\nRejection Reason: Prior accident history not disclosed",
        );
    }

    #[tokio::test]
    async fn test_concurrent_decisions_apply_once() {
        let (store, service) =
            setup(vec![ProposalBuilder::new().with_status("Under Review").build()]).await;

        let (approved, rejected) = tokio::join!(
            service.approve(PROPOSAL, None),
            service.reject(PROPOSAL, Some("duplicate"), None),
        );

        assert!(approved.is_ok() ^ rejected.is_ok(), "exactly one decision must win");
        let loser = approved.err().or(rejected.err()).unwrap();
        assert!(
            matches!(
                loser,
                WorkflowError::Conflict(_) | WorkflowError::ActionNotPermitted { .. }
            ),
            "got {:?}",
            loser
        );
        assert_eq!(store.get(DocType::Proposal, PROPOSAL).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_payment_then_conversion() {
        let (store, service) = setup(vec![ProposalBuilder::new().approved().build()]).await;

        let payment = service.record_payment(PROPOSAL, None).await.unwrap();
        assert_eq!(payment.doctype, DocType::PaymentEntry);
        let draft = store.get(DocType::PaymentEntry, &payment.name).await.unwrap();
        assert_field_eq(&draft, "reference_no", PROPOSAL);
        assert_field_eq(&draft, "party", "CUST-0001");
        assert_eq!(amount(&draft, "paid_amount"), dec!(12500.00));
        assert_eq!(draft.docstatus(), DocStatus::Draft);

        // Recording again before submission hands back the same draft.
        let again = service.record_payment(PROPOSAL, None).await.unwrap();
        assert_eq!(again.name, payment.name);

        service.submit_payment(&payment.name, None).await.unwrap();
        let policy = service.convert_to_policy(PROPOSAL, None).await.unwrap();

        let issued = store.get(DocType::Policy, &policy.name).await.unwrap();
        assert_field_eq(&issued, "status", "Active");
        assert_field_eq(&issued, "insurance_proposal", PROPOSAL);
        assert_field_eq(&issued, "vehicle", "VEH-2026-00001");
        assert_field_eq(&issued, "policy_start_date", "2026-01-01");
        assert_eq!(amount(&issued, "premium_paid"), dec!(12500.00));
        assert_eq!(amount(&issued, "outstanding_amount"), Decimal::ZERO);

        let proposal = store.get(DocType::Proposal, PROPOSAL).await.unwrap();
        assert_field_eq(&proposal, "policy", policy.name.as_str());
        assert!(service
            .available_actions(DocType::Proposal, PROPOSAL)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_submitting_a_payment_twice_conflicts() {
        let (_, service) = setup(vec![
            ProposalBuilder::new().approved().build(),
            PaymentEntryBuilder::new("PAY-2026-00001", DocType::Proposal, PROPOSAL).build(),
        ])
        .await;
        service.submit_payment("PAY-2026-00001", None).await.unwrap();
        let err = service.submit_payment("PAY-2026-00001", None).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_second_conversion_conflicts() {
        let (store, service) = setup(vec![
            ProposalBuilder::new().approved().build(),
            PaymentEntryBuilder::new("PAY-2026-00001", DocType::Proposal, PROPOSAL)
                .with_amount(dec!(5000))
                .submitted()
                .build(),
        ])
        .await;

        let first = service.convert_to_policy(PROPOSAL, None).await.unwrap();
        let issued = store.get(DocType::Policy, &first.name).await.unwrap();
        assert_field_eq(&issued, "status", "Pending Payment");
        assert_eq!(amount(&issued, "outstanding_amount"), dec!(7500.00));

        let err = service.convert_to_policy(PROPOSAL, None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::ActionNotPermitted { .. }));

        let procedures = StoreProcedures::new(store.clone());
        let err = procedures
            .create_policy_from_proposal(PROPOSAL, None)
            .await
            .unwrap_err();
        assert_conflict(&err);
        assert!(err.to_string().contains(first.name.as_str()));
        assert_eq!(store.count(DocType::Policy).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_conversions_issue_one_policy() {
        let (store, _) = setup(vec![
            ProposalBuilder::new().approved().build(),
            PaymentEntryBuilder::new("PAY-2026-00001", DocType::Proposal, PROPOSAL)
                .submitted()
                .build(),
        ])
        .await;
        let procedures = StoreProcedures::new(store.clone());

        let (a, b) = tokio::join!(
            procedures.create_policy_from_proposal(PROPOSAL, None),
            procedures.create_policy_from_proposal(PROPOSAL, None),
        );
        assert!(a.is_ok() ^ b.is_ok());
        assert_eq!(store.count(DocType::Policy).await, 1);
    }
}

mod policies {
    use super::*;

    fn payment(amount: Decimal) -> PolicyPayment {
        PolicyPayment::new(amount, "Bank Transfer", "HDFC Current - IC")
    }

    #[tokio::test]
    async fn test_clearing_payment_activates_policy() {
        let (store, service) = setup(vec![PolicyBuilder::new().pending_payment().build()]).await;

        let entry = service
            .record_policy_payment(POLICY, &payment(dec!(12500.00)), None)
            .await
            .unwrap();

        let submitted = store.get(DocType::PaymentEntry, &entry.name).await.unwrap();
        assert_eq!(submitted.docstatus(), DocStatus::Submitted);
        assert_field_eq(&submitted, "reference_doctype", "Insurance Policy");
        assert_field_eq(&submitted, "reference_name", POLICY);

        let policy = store.get(DocType::Policy, POLICY).await.unwrap();
        assert_field_eq(&policy, "status", "Active");
        assert_eq!(amount(&policy, "outstanding_amount"), Decimal::ZERO);
        assert_eq!(amount(&policy, "premium_paid"), dec!(12500.00));
    }

    #[tokio::test]
    async fn test_partial_payment_keeps_policy_pending() {
        let (store, service) = setup(vec![PolicyBuilder::new().pending_payment().build()]).await;
        service
            .record_policy_payment(POLICY, &payment(dec!(2500)), None)
            .await
            .unwrap();

        let policy = store.get(DocType::Policy, POLICY).await.unwrap();
        assert_field_eq(&policy, "status", "Pending Payment");
        assert_eq!(amount(&policy, "outstanding_amount"), dec!(10000.00));

        let offered = service.available_actions(DocType::Policy, POLICY).await.unwrap();
        assert_eq!(actions(offered)[0], Action::RecordPayment);
    }

    #[tokio::test]
    async fn test_invalid_payment_writes_nothing() {
        let (store, service) = setup(vec![PolicyBuilder::new().pending_payment().build()]).await;
        let mut bad = payment(dec!(100));
        bad.mode_of_payment = "  ".into();

        let err = service.record_policy_payment(POLICY, &bad, None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(store.count(DocType::PaymentEntry).await, 0);
    }

    #[tokio::test]
    async fn test_paid_up_policy_refuses_payment() {
        let (_, service) = setup(vec![PolicyBuilder::new().build()]).await;
        let err = service
            .record_policy_payment(POLICY, &payment(dec!(100)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ActionNotPermitted { .. }));
    }

    /// Store where every policy write loses to a concurrent edit while `busy` is set
    struct BusyPolicyStore {
        inner: Arc<InMemoryDocumentStore>,
        busy: AtomicBool,
    }

    impl DomainPort for BusyPolicyStore {}

    #[async_trait]
    impl HealthCheckable for BusyPolicyStore {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait]
    impl DocumentStore for BusyPolicyStore {
        async fn get(&self, doctype: DocType, name: &str) -> Result<Document, PortError> {
            self.inner.get(doctype, name).await
        }

        async fn insert(&self, doctype: DocType, name: &str, fields: FieldMap) -> Result<Document, PortError> {
            self.inner.insert(doctype, name, fields).await
        }

        async fn set_fields_if(
            &self,
            doctype: DocType,
            name: &str,
            preconditions: &[Precondition],
            updates: FieldMap,
        ) -> Result<Document, PortError> {
            if doctype == DocType::Policy && self.busy.load(Ordering::SeqCst) {
                self.inner
                    .set_fields_if(doctype, name, &[], fields(json!({"remarks": "edited elsewhere"})))
                    .await?;
            }
            self.inner.set_fields_if(doctype, name, preconditions, updates).await
        }

        async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, PortError> {
            self.inner.list(query).await
        }
    }

    #[tokio::test]
    async fn test_unapplied_payment_returns_to_draft() {
        let inner = seeded_store(vec![PolicyBuilder::new().pending_payment().build()]).await;
        let store = Arc::new(BusyPolicyStore {
            inner: inner.clone(),
            busy: AtomicBool::new(true),
        });
        let procedures = Arc::new(StoreProcedures::new(store.clone()));
        let service = WorkflowService::new(store.clone(), procedures);

        let err = service
            .record_policy_payment(POLICY, &payment(dec!(12500.00)), None)
            .await
            .unwrap_err();
        assert!(err.is_conflict(), "got {:?}", err);

        let entries = inner.list(&DocumentQuery::new(DocType::PaymentEntry)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].docstatus(), DocStatus::Draft);

        let policy = inner.get(DocType::Policy, POLICY).await.unwrap();
        assert_field_eq(&policy, "status", "Pending Payment");
        assert_eq!(amount(&policy, "premium_paid"), Decimal::ZERO);
        assert_eq!(amount(&policy, "outstanding_amount"), dec!(12500.00));

        store.busy.store(false, Ordering::SeqCst);
        service.submit_payment(&entries[0].name, None).await.unwrap();

        let policy = inner.get(DocType::Policy, POLICY).await.unwrap();
        assert_field_eq(&policy, "status", "Active");
        assert_eq!(amount(&policy, "premium_paid"), dec!(12500.00));
    }

    #[tokio::test]
    async fn test_cancel_once() {
        let (_, service) = setup(vec![PolicyBuilder::new().build()]).await;
        let cancelled = service.cancel_policy(POLICY, None).await.unwrap();
        assert_field_eq(&cancelled, "status", "Cancelled");

        let err = service.cancel_policy(POLICY, None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::ActionNotPermitted { .. }));
    }

    #[tokio::test]
    async fn test_claim_on_boundary_dates_is_accepted() {
        let (store, service) = setup(vec![PolicyBuilder::new().build()]).await;
        let period = TemporalFixtures::coverage_period();

        for date in [TemporalFixtures::policy_start(), TemporalFixtures::policy_end()] {
            let mut intake = ClaimIntake::new().with_amount(dec!(40000));
            intake.set_date_of_loss(date, &period).unwrap();

            let claim = service.create_claim(POLICY, &intake, None).await.unwrap();
            assert_field_eq(&claim, "status", "Reported");
            assert_field_eq(&claim, "policy", POLICY);
            assert_field_eq(&claim, "policy_number", POLICY);
            assert_field_eq(&claim, "customer", "CUST-0001");
            assert_field_eq(&claim, "date_of_loss", date.to_string());
        }
        assert_eq!(store.count(DocType::Claim).await, 2);
    }

    #[tokio::test]
    async fn test_claim_outside_stored_cover_is_refused() {
        let (store, service) = setup(vec![PolicyBuilder::new()
            .with_period(TemporalFixtures::policy_start(), TemporalFixtures::loss_date())
            .build()])
        .await;

        // Valid against the period the intake was prepared with, not the stored one.
        let mut intake = ClaimIntake::new();
        intake
            .set_date_of_loss(TemporalFixtures::today(), &TemporalFixtures::coverage_period())
            .unwrap();

        let err = service.create_claim(POLICY, &intake, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Date of Loss must be within the policy period (2026-01-01 to 2026-03-15)"
        );
        assert_eq!(store.count(DocType::Claim).await, 0);
    }

    #[tokio::test]
    async fn test_claim_needs_a_date() {
        let (_, service) = setup(vec![PolicyBuilder::new().build()]).await;
        let err = service
            .create_claim(POLICY, &ClaimIntake::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Date of Loss is required");
    }

    fn intake_on(date: chrono::NaiveDate, amount: Decimal) -> ClaimIntake {
        let mut intake = ClaimIntake::new().with_amount(amount);
        intake.set_date_of_loss(date, &TemporalFixtures::coverage_period()).unwrap();
        intake
    }

    #[tokio::test]
    async fn test_claim_inside_waiting_period_is_refused() {
        let (store, service) = setup(vec![
            PolicyBuilder::new().build(),
            PlanBuilder::new().with_waiting_period(30).build(),
        ])
        .await;
        let early = TemporalFixtures::policy_start() + chrono::Duration::days(10);

        let err = service
            .create_claim(POLICY, &intake_on(early, dec!(40000)), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Claim filed within waiting period of 30 days.");
        assert_eq!(store.count(DocType::Claim).await, 0);

        service
            .create_claim(POLICY, &intake_on(TemporalFixtures::loss_date(), dec!(40000)), None)
            .await
            .unwrap();
        assert_eq!(store.count(DocType::Claim).await, 1);
    }

    #[tokio::test]
    async fn test_rejected_claims_do_not_count_towards_limit() {
        let store = seeded_store(vec![
            PolicyBuilder::new().build(),
            ClaimBuilder::new().with_name("CLM-1").with_status("Rejected").build(),
            ClaimBuilder::new().with_name("CLM-2").build(),
        ])
        .await;
        let service = WorkflowService::new(store.clone(), Arc::new(StoreProcedures::new(store.clone())))
            .with_claim_limits(ClaimLimits::new(2, Decimal::ONE_HUNDRED));
        let intake = intake_on(TemporalFixtures::loss_date(), dec!(40000));

        service.create_claim(POLICY, &intake, None).await.unwrap();

        let err = service.create_claim(POLICY, &intake, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Maximum claims per policy (2) reached.");
        assert_eq!(store.count(DocType::Claim).await, 3);
    }

    #[tokio::test]
    async fn test_claim_amount_is_limited_by_idv() {
        let store = seeded_store(vec![PolicyBuilder::new().build()]).await;
        let service = WorkflowService::new(store.clone(), Arc::new(MockServerProcedures::new()))
            .with_claim_limits(ClaimLimits::new(999, dec!(50)));

        let err = service
            .create_claim(POLICY, &intake_on(TemporalFixtures::loss_date(), dec!(300000)), None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Claim amount exceeds allowed limit (50% of IDV). Max allowed: 275000"
        );
        assert_eq!(store.count(DocType::Claim).await, 0);

        service
            .create_claim(POLICY, &intake_on(TemporalFixtures::loss_date(), dec!(275000)), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_policy_takes_no_claims() {
        let (_, service) = setup(vec![PolicyBuilder::new().with_status("Cancelled").build()]).await;
        let mut intake = ClaimIntake::new();
        intake
            .set_date_of_loss(TemporalFixtures::loss_date(), &TemporalFixtures::coverage_period())
            .unwrap();

        let err = service.create_claim(POLICY, &intake, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Action 'Create Claim' is not available for Insurance Policy in status Cancelled"
        );
    }
}

mod claims {
    use super::*;

    #[tokio::test]
    async fn test_settlement_posts_entry_and_settles() {
        let (store, service) = setup(vec![ClaimBuilder::new().approved(dec!(60000)).build()]).await;

        let entry = service.create_settlement(CLAIM, None).await.unwrap();
        assert_eq!(entry.doctype, DocType::JournalEntry);

        let journal = store.get(DocType::JournalEntry, &entry.name).await.unwrap();
        assert_eq!(amount(&journal, "amount"), dec!(60000));
        assert_field_eq(&journal, "reference_claim", CLAIM);
        assert_field_eq(&journal, "user_remark", format!("Claim Settlement for {}", CLAIM));
        assert_eq!(journal.docstatus(), DocStatus::Submitted);

        let claim = store.get(DocType::Claim, CLAIM).await.unwrap();
        assert_field_eq(&claim, "status", "Settled");
        assert_field_eq(&claim, "settlement_journal_entry", entry.name.as_str());
    }

    #[tokio::test]
    async fn test_second_settlement_conflicts() {
        let (store, service) = setup(vec![ClaimBuilder::new().approved(dec!(60000)).build()]).await;
        service.create_settlement(CLAIM, None).await.unwrap();

        let err = service.create_settlement(CLAIM, None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::ActionNotPermitted { .. }));

        let err = StoreProcedures::new(store.clone())
            .create_settlement_journal_entry(CLAIM, None)
            .await
            .unwrap_err();
        assert_conflict(&err);
        assert_eq!(store.count(DocType::JournalEntry).await, 1);
    }

    #[tokio::test]
    async fn test_failed_procedure_leaves_claim_untouched() {
        let store = seeded_store(vec![ClaimBuilder::new().approved(dec!(60000)).build()]).await;
        let procedures = Arc::new(
            MockServerProcedures::new()
                .with_failure("create_settlement_journal_entry", "ledger period closed"),
        );
        let service = WorkflowService::new(store.clone(), procedures.clone());
        let before = store.get(DocType::Claim, CLAIM).await.unwrap();

        let err = service.create_settlement(CLAIM, None).await.unwrap_err();
        match err {
            WorkflowError::Procedure { procedure, message } => {
                assert_eq!(procedure, "create_settlement_journal_entry");
                assert!(message.contains("ledger period closed"));
            }
            other => panic!("expected a procedure error, got {:?}", other),
        }
        assert_unchanged(&before, &store.get(DocType::Claim, CLAIM).await.unwrap());
        assert_eq!(procedures.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_gate_refusal_skips_procedure() {
        let store = seeded_store(vec![ClaimBuilder::new().build()]).await;
        let procedures = Arc::new(MockServerProcedures::new());
        let service = WorkflowService::new(store, procedures.clone());

        assert!(service.create_settlement(CLAIM, None).await.is_err());
        assert!(procedures.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_advance_follows_lifecycle() {
        let (_, service) = setup(vec![ClaimBuilder::new().with_status("Survey Assigned").build()]).await;

        let updated = service
            .advance_claim(CLAIM, ClaimStatus::SurveyCompleted, None, None)
            .await
            .unwrap();
        assert_field_eq(&updated, "status", "Survey Completed");

        let updated = service
            .advance_claim(CLAIM, ClaimStatus::Approved, Some(dec!(70000)), None)
            .await
            .unwrap();
        assert_field_eq(&updated, "status", "Approved");
        assert_eq!(amount(&updated, "approved_amount"), dec!(70000));
    }

    #[tokio::test]
    async fn test_advance_refuses_skips_and_regressions() {
        let (_, service) = setup(vec![ClaimBuilder::new().build()]).await;

        let err = service
            .advance_claim(CLAIM, ClaimStatus::Approved, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ActionNotPermitted { .. }));

        let err = service
            .advance_claim(CLAIM, ClaimStatus::Settled, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }
}

mod premium {
    use super::*;

    #[tokio::test]
    async fn test_quote_uses_stored_plan() {
        let (_, service) = setup(vec![PlanBuilder::new().build()]).await;
        let quote = service
            .quote_premium(
                "Comprehensive Private Car",
                dec!(550000),
                &["Roadside Assistance".to_string()],
                dec!(25),
            )
            .await
            .unwrap();

        assert_eq!(quote.od_premium_base, dec!(13750));
        assert_eq!(quote.ncb_discount, dec!(3437.50));
        assert_eq!(quote.od_premium, dec!(10312.50));
        assert_eq!(quote.total_net_premium, dec!(13927.50));
        assert_eq!(quote.total_gst, dec!(2506.95));
        assert_eq!(quote.grand_total_premium, dec!(16434.45));
    }

    #[tokio::test]
    async fn test_unknown_plan() {
        let (_, service) = setup(vec![]).await;
        let err = service
            .quote_premium("Bronze", dec!(550000), &[], Decimal::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }
}

mod survey_assignment {
    use super::*;

    fn selection(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_mixed_selection_assigns_only_reported() {
        let (store, service) = setup(vec![
            ClaimBuilder::new().with_name("CLM-1").build(),
            ClaimBuilder::new().with_name("CLM-2").with_status("Survey Completed").build(),
            ClaimBuilder::new().with_name("CLM-3").build(),
        ])
        .await;

        let report = service
            .assign_surveyor(
                &selection(&["CLM-1", "CLM-2", "CLM-3", "CLM-404"]),
                "surveyor@example.com",
                Some(TemporalFixtures::today()),
                None,
            )
            .await
            .unwrap();

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.message(), "2 Claims successfully moved to Survey");
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.excluded[0].claim, "CLM-2");
        assert!(report
            .results
            .iter()
            .any(|r| matches!(r, AssignmentResult::Failed { claim, .. } if claim == "CLM-404")));

        let assigned = store.get(DocType::Claim, "CLM-1").await.unwrap();
        assert_field_eq(&assigned, "status", "Survey Assigned");
        assert_field_eq(&assigned, "surveyor", "surveyor@example.com");
        assert_field_eq(&assigned, "survey_date", "2026-06-01");

        let untouched = store.get(DocType::Claim, "CLM-2").await.unwrap();
        assert_eq!(untouched.version, 1);
        assert_field_absent(&untouched, "surveyor");
    }

    #[tokio::test]
    async fn test_repeated_selection_is_assigned_once() {
        let (store, service) = setup(vec![ClaimBuilder::new().build()]).await;

        let report = service
            .assign_surveyor(
                &selection(&[CLAIM, " CLM-2026-00001 ", CLAIM]),
                "surveyor@example.com",
                None,
                None,
            )
            .await
            .unwrap();

        assert_eq!(report.results, vec![AssignmentResult::Assigned { claim: CLAIM.into() }]);
        assert_eq!(report.success_count(), 1);
        assert!(report.excluded.is_empty());

        let assigned = store.get(DocType::Claim, CLAIM).await.unwrap();
        assert_eq!(assigned.version, 2);
    }

    #[tokio::test]
    async fn test_selection_without_reported_claims() {
        let (_, service) = setup(vec![ClaimBuilder::new().with_status("Approved").build()]).await;
        let err = service
            .assign_surveyor(&selection(&[CLAIM]), "surveyor@example.com", None, None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Only claims in 'Reported' status can be moved to Survey"
        );
    }

    #[tokio::test]
    async fn test_request_is_checked_first() {
        let (_, service) = setup(vec![]).await;
        let err = service
            .assign_surveyor(&[], "surveyor@example.com", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Please select at least one claim");

        let err = service
            .assign_surveyor(&selection(&[CLAIM]), " ", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Surveyor is required");
    }

    /// Store that moves one claim on just before it is written
    struct RacingStore {
        inner: Arc<InMemoryDocumentStore>,
        victim: String,
    }

    impl DomainPort for RacingStore {}

    #[async_trait]
    impl HealthCheckable for RacingStore {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait]
    impl DocumentStore for RacingStore {
        async fn get(&self, doctype: DocType, name: &str) -> Result<Document, PortError> {
            self.inner.get(doctype, name).await
        }

        async fn insert(&self, doctype: DocType, name: &str, fields: FieldMap) -> Result<Document, PortError> {
            self.inner.insert(doctype, name, fields).await
        }

        async fn set_fields_if(
            &self,
            doctype: DocType,
            name: &str,
            preconditions: &[Precondition],
            updates: FieldMap,
        ) -> Result<Document, PortError> {
            if name == self.victim {
                self.inner
                    .set_fields_if(doctype, name, &[], fields(json!({"status": "Survey Completed"})))
                    .await?;
            }
            self.inner.set_fields_if(doctype, name, preconditions, updates).await
        }

        async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>, PortError> {
            self.inner.list(query).await
        }
    }

    #[tokio::test]
    async fn test_lost_write_is_reported_per_item() {
        let inner = seeded_store(vec![
            ClaimBuilder::new().with_name("CLM-1").build(),
            ClaimBuilder::new().with_name("CLM-2").build(),
        ])
        .await;
        let store = Arc::new(RacingStore {
            inner: inner.clone(),
            victim: "CLM-2".into(),
        });
        let service = WorkflowService::new(store, Arc::new(MockServerProcedures::new()));

        let report = service
            .assign_surveyor(&selection(&["CLM-1", "CLM-2"]), "surveyor@example.com", None, None)
            .await
            .unwrap();

        assert_eq!(report.success_count(), 1);
        assert!(matches!(&report.results[1], AssignmentResult::Conflict { claim, .. } if claim == "CLM-2"));

        let raced = inner.get(DocType::Claim, "CLM-2").await.unwrap();
        assert_field_eq(&raced, "status", "Survey Completed");
        assert_field_absent(&raced, "surveyor");
    }
}
