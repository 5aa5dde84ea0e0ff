//! Store-backed server procedures
//!
//! `StoreProcedures` implements [`ServerProcedures`] directly against the
//! document store. Each procedure first reserves its effect on the source
//! document with a conditional write and only then creates the new
//! document, so two concurrent callers cannot both issue a policy for one
//! proposal or post two settlements for one claim.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use core_kernel::{
    DocStatus, DocType, Document, DocumentQuery, DocumentStore, DomainPort, HealthCheckResult,
    HealthCheckable, JournalEntryName, OperationMetadata, PaymentEntryName, PolicyName, PortError,
    Precondition,
};

use crate::error::WorkflowError;
use crate::ports::{ArtifactRef, ServerProcedures};
use crate::state::{decimal_field, decimal_value, field_map, status_guard, text_field};
use crate::status::{ClaimStatus, PolicyStatus, ProposalStatus};
use crate::validation::PolicyPayment;

/// Attempts at applying a payment before giving up on concurrent edits
const PAYMENT_APPLY_ATTEMPTS: usize = 3;

fn to_port(error: WorkflowError) -> PortError {
    match error {
        WorkflowError::Validation(message) => PortError::validation(message),
        WorkflowError::Conflict(message) => PortError::conflict(message),
        WorkflowError::InvalidDocument(message) => PortError::Transformation { message },
        WorkflowError::Port(e) => e,
        other => PortError::internal(other.to_string()),
    }
}

fn status_is(doc: &Document, label: &str) -> bool {
    text_field(doc, "status") == Some(label)
}

fn amount(doc: &Document, field: &str) -> Result<Decimal, PortError> {
    Ok(decimal_field(doc, field).map_err(to_port)?.unwrap_or_default())
}

/// `ServerProcedures` over a `DocumentStore`
pub struct StoreProcedures {
    store: Arc<dyn DocumentStore>,
}

impl StoreProcedures {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Sum of submitted payments referencing a proposal
    pub async fn submitted_proposal_payments(&self, proposal: &str) -> Result<(usize, Decimal), PortError> {
        let query = DocumentQuery::new(DocType::PaymentEntry)
            .filter("reference_doctype", DocType::Proposal.as_str())
            .filter("reference_name", proposal)
            .filter("docstatus", DocStatus::Submitted);
        let payments = self.store.list(&query).await?;
        let mut total = Decimal::ZERO;
        for payment in &payments {
            total += amount(payment, "paid_amount")?;
        }
        Ok((payments.len(), total))
    }

    /// Adds a submitted payment to a policy's paid premium
    ///
    /// The policy is re-read on every attempt so the increment is always
    /// applied to the latest stored totals.
    async fn apply_payment_to_policy(&self, policy: &str, paid: Decimal) -> Result<Document, PortError> {
        let mut last_conflict = None;

        for attempt in 1..=PAYMENT_APPLY_ATTEMPTS {
            let doc = self.store.get(DocType::Policy, policy).await?;
            let premium = amount(&doc, "premium_amount")?;
            let premium_paid = amount(&doc, "premium_paid")? + paid;
            let outstanding = premium - premium_paid;

            let mut updates = field_map(json!({
                "premium_paid": decimal_value(premium_paid),
                "outstanding_amount": decimal_value(outstanding),
            }));
            if outstanding <= Decimal::ZERO && status_is(&doc, PolicyStatus::PendingPayment.label()) {
                updates.insert("status".into(), Value::from(PolicyStatus::Active.label()));
            }

            match self
                .store
                .set_fields_if(DocType::Policy, policy, &[Precondition::version(doc.version)], updates)
                .await
            {
                Ok(updated) => {
                    info!(policy, %premium_paid, %outstanding, "Payment applied to policy");
                    return Ok(updated);
                }
                Err(e) if e.is_conflict() => {
                    debug!(policy, attempt, "Policy changed while applying payment, retrying");
                    last_conflict = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_conflict.unwrap_or_else(|| PortError::conflict(format!("Policy {} is busy", policy))))
    }

    async fn insert_payment_entry(&self, fields: Value) -> Result<ArtifactRef, PortError> {
        let name = PaymentEntryName::generate().into_inner();
        self.store
            .insert(DocType::PaymentEntry, &name, field_map(fields))
            .await?;
        Ok(ArtifactRef::new(DocType::PaymentEntry, name))
    }
}

impl DomainPort for StoreProcedures {}

#[async_trait]
impl HealthCheckable for StoreProcedures {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let store = self.store.health_check().await;
        HealthCheckResult {
            adapter_id: "store-procedures".to_string(),
            status: store.status,
            latency_ms: start.elapsed().as_millis() as u64,
            message: store.message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ServerProcedures for StoreProcedures {
    #[instrument(skip(self, metadata), fields(actor = tracing::field::Empty))]
    async fn create_proposal_payment_entry(
        &self,
        proposal: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, PortError> {
        let actor = metadata.as_ref().map_or("system", |m| m.actor()).to_string();
        tracing::Span::current().record("actor", actor.as_str());

        let doc = self.store.get(DocType::Proposal, proposal).await?;
        if !status_is(&doc, ProposalStatus::Approved.label()) || !doc.docstatus().is_submitted() {
            return Err(PortError::conflict("Only Approved proposals can be paid"));
        }

        let (submitted, _) = self.submitted_proposal_payments(proposal).await?;
        if submitted > 0 {
            return Err(PortError::conflict(format!(
                "A payment has already been submitted for proposal {}",
                proposal
            )));
        }

        let drafts = self
            .store
            .list(
                &DocumentQuery::new(DocType::PaymentEntry)
                    .filter("reference_doctype", DocType::Proposal.as_str())
                    .filter("reference_name", proposal)
                    .filter("docstatus", DocStatus::Draft)
                    .limit(1),
            )
            .await?;
        if let Some(draft) = drafts.first() {
            debug!(proposal, payment_entry = %draft.name, "Reusing draft payment entry");
            return Ok(ArtifactRef::new(DocType::PaymentEntry, draft.name.clone()));
        }

        let premium = amount(&doc, "premium_amount")?;
        if premium <= Decimal::ZERO {
            return Err(PortError::validation("Premium Amount must be set before payment"));
        }

        let artifact = self
            .insert_payment_entry(json!({
                "payment_type": "Receive",
                "party_type": "Customer",
                "party": doc.get("customer").cloned().unwrap_or(Value::Null),
                "paid_amount": decimal_value(premium),
                "received_amount": decimal_value(premium),
                "reference_doctype": DocType::Proposal.as_str(),
                "reference_name": proposal,
                "reference_no": proposal,
                "reference_date": Utc::now().date_naive().to_string(),
                "remarks": format!("Premium payment for proposal {}", proposal),
                "owner": actor,
                "docstatus": DocStatus::Draft,
            }))
            .await?;

        info!(proposal, payment_entry = %artifact.name, %premium, "Draft payment entry created");
        Ok(artifact)
    }

    #[instrument(skip(self, _metadata))]
    async fn submit_payment_entry(
        &self,
        payment_entry: &str,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, PortError> {
        let doc = self.store.get(DocType::PaymentEntry, payment_entry).await?;
        if doc.docstatus() != DocStatus::Draft {
            return Err(PortError::conflict(format!(
                "Payment Entry {} is not a draft",
                payment_entry
            )));
        }
        let paid = amount(&doc, "paid_amount")?;
        if paid <= Decimal::ZERO {
            return Err(PortError::validation("Paid Amount must be positive"));
        }

        let submitted = self
            .store
            .set_fields_if(
                DocType::PaymentEntry,
                payment_entry,
                &[Precondition::version(doc.version)],
                field_map(json!({"docstatus": DocStatus::Submitted})),
            )
            .await?;

        if submitted.get_str("reference_doctype") == Some(DocType::Policy.as_str()) {
            if let Some(policy) = text_field(&submitted, "reference_name") {
                if let Err(e) = self.apply_payment_to_policy(policy, paid).await {
                    error!(payment_entry, policy, error = %e, "Payment could not be applied to policy, reverting to draft");
                    self.store
                        .set_fields_if(
                            DocType::PaymentEntry,
                            payment_entry,
                            &[Precondition::version(submitted.version)],
                            field_map(json!({"docstatus": DocStatus::Draft})),
                        )
                        .await?;
                    return Err(e);
                }
            }
        }

        info!(payment_entry, %paid, "Payment entry submitted");
        Ok(ArtifactRef::new(DocType::PaymentEntry, payment_entry))
    }

    #[instrument(skip(self, _metadata))]
    async fn create_policy_from_proposal(
        &self,
        proposal: &str,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, PortError> {
        let doc = self.store.get(DocType::Proposal, proposal).await?;
        if !status_is(&doc, ProposalStatus::Approved.label()) {
            return Err(PortError::conflict("Only Approved proposals can be converted to policies"));
        }

        let existing = match text_field(&doc, "policy") {
            Some(policy) => Some(policy.to_string()),
            None => self
                .store
                .list(
                    &DocumentQuery::new(DocType::Policy)
                        .filter("insurance_proposal", proposal)
                        .limit(1),
                )
                .await?
                .first()
                .map(|p| p.name.clone()),
        };
        if let Some(policy) = existing {
            return Err(PortError::conflict(format!(
                "A policy already exists for this proposal: {}",
                policy
            )));
        }

        let premium = amount(&doc, "premium_amount")?;
        let (_, premium_paid) = self.submitted_proposal_payments(proposal).await?;
        let outstanding = premium - premium_paid;
        let status = if outstanding <= Decimal::ZERO {
            PolicyStatus::Active
        } else {
            PolicyStatus::PendingPayment
        };

        let policy = PolicyName::generate().into_inner();
        self.store
            .set_fields_if(
                DocType::Proposal,
                proposal,
                &[status_guard(&doc), Precondition::field_absent("policy")],
                field_map(json!({"policy": policy})),
            )
            .await?;

        let copy = |field: &str| doc.get(field).cloned().unwrap_or(Value::Null);
        let fields = field_map(json!({
            "policy_number": policy,
            "status": status.label(),
            "docstatus": DocStatus::Draft,
            "customer": copy("customer"),
            "insurance_proposal": proposal,
            "insurance_plan": copy("insurance_plan"),
            "vehicle": copy("vehicle"),
            "vehicle_idv": copy("vehicle_idv"),
            "policy_start_date": copy("policy_duration_from"),
            "policy_end_date": copy("policy_duration_to"),
            "premium_amount": decimal_value(premium),
            "premium_paid": decimal_value(premium_paid),
            "outstanding_amount": decimal_value(outstanding),
        }));

        if let Err(e) = self.store.insert(DocType::Policy, &policy, fields).await {
            warn!(proposal, %policy, error = %e, "Policy insert failed, releasing proposal");
            self.store
                .set_fields_if(
                    DocType::Proposal,
                    proposal,
                    &[Precondition::field_equals("policy", policy.as_str())],
                    field_map(json!({"policy": null})),
                )
                .await?;
            return Err(e);
        }

        info!(proposal, %policy, status = status.label(), "Policy created from proposal");
        Ok(ArtifactRef::new(DocType::Policy, policy))
    }

    #[instrument(skip(self, payment, metadata), fields(amount = %payment.amount))]
    async fn record_policy_payment(
        &self,
        policy: &str,
        payment: &PolicyPayment,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, PortError> {
        payment.validate().map_err(to_port)?;

        let doc = self.store.get(DocType::Policy, policy).await?;
        if amount(&doc, "outstanding_amount")? <= Decimal::ZERO {
            return Err(PortError::conflict(format!(
                "Policy {} has no outstanding premium",
                policy
            )));
        }

        let actor = metadata.as_ref().map_or("system", |m| m.actor()).to_string();
        let reference_date = payment.reference_date.unwrap_or_else(|| Utc::now().date_naive());
        let artifact = self
            .insert_payment_entry(json!({
                "payment_type": "Receive",
                "party_type": "Customer",
                "party": doc.get("customer").cloned().unwrap_or(Value::Null),
                "mode_of_payment": payment.mode_of_payment.trim(),
                "paid_to": payment.paid_to.trim(),
                "paid_amount": decimal_value(payment.amount),
                "received_amount": decimal_value(payment.amount),
                "reference_doctype": DocType::Policy.as_str(),
                "reference_name": policy,
                "reference_no": payment.reference_no.clone().unwrap_or_else(|| policy.to_string()),
                "reference_date": reference_date.to_string(),
                "remarks": format!("Premium payment for policy {}", policy),
                "owner": actor,
                "docstatus": DocStatus::Draft,
            }))
            .await?;

        self.submit_payment_entry(&artifact.name, metadata).await?;
        Ok(artifact)
    }

    #[instrument(skip(self, _metadata))]
    async fn create_settlement_journal_entry(
        &self,
        claim: &str,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, PortError> {
        let doc = self.store.get(DocType::Claim, claim).await?;
        if !status_is(&doc, ClaimStatus::Approved.label()) {
            return Err(PortError::conflict("Only Approved claims can be settled."));
        }
        if let Some(existing) = text_field(&doc, "settlement_journal_entry") {
            return Err(PortError::conflict(format!("Settlement already exists: {}", existing)));
        }

        let settlement = match decimal_field(&doc, "approved_amount").map_err(to_port)? {
            Some(approved) => approved,
            None => amount(&doc, "claim_amount")?,
        };
        if settlement <= Decimal::ZERO {
            return Err(PortError::validation("Approved Amount must be set before settlement"));
        }

        let journal_entry = JournalEntryName::generate().into_inner();
        let today = Utc::now().date_naive().to_string();

        self.store
            .set_fields_if(
                DocType::Claim,
                claim,
                &[status_guard(&doc), Precondition::field_absent("settlement_journal_entry")],
                field_map(json!({
                    "status": ClaimStatus::Settled.label(),
                    "settlement_journal_entry": journal_entry,
                    "settlement_date": today,
                })),
            )
            .await?;

        let fields = field_map(json!({
            "voucher_type": "Journal Entry",
            "posting_date": today,
            "reference_type": DocType::Claim.as_str(),
            "reference_claim": claim,
            "party": doc.get("customer").cloned().unwrap_or(Value::Null),
            "amount": decimal_value(settlement),
            "user_remark": format!("Claim Settlement for {}", claim),
            "docstatus": DocStatus::Submitted,
        }));

        if let Err(e) = self.store.insert(DocType::JournalEntry, &journal_entry, fields).await {
            warn!(claim, %journal_entry, error = %e, "Journal entry insert failed, reopening claim");
            self.store
                .set_fields_if(
                    DocType::Claim,
                    claim,
                    &[Precondition::field_equals("settlement_journal_entry", journal_entry.as_str())],
                    field_map(json!({
                        "status": ClaimStatus::Approved.label(),
                        "settlement_journal_entry": null,
                        "settlement_date": null,
                    })),
                )
                .await?;
            return Err(e);
        }

        info!(claim, %journal_entry, %settlement, "Claim settled");
        Ok(ArtifactRef::new(DocType::JournalEntry, journal_entry))
    }
}
