//! Workflow domain services
//!
//! `WorkflowService` executes the actions the gate offers. Every executor
//! follows the same shape: read the document, rebuild its snapshot, ask the
//! gate, then write conditionally on the state that was read. A write that
//! loses against a concurrent change surfaces as `WorkflowError::Conflict`
//! and leaves the document as the other writer left it.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use core_kernel::{
    ClaimName, CoveragePeriod, DocStatus, DocType, Document, DocumentQuery, DocumentStore, FieldMap,
    OperationMetadata, PortError, Precondition,
};
use domain_vehicle::Vehicle;

use crate::action::{Action, ActionDescriptor};
use crate::error::WorkflowError;
use crate::gate::{gate, require};
use crate::premium::{InsurancePlan, PremiumQuote};
use crate::ports::{ArtifactRef, ServerProcedures};
use crate::state::{
    decimal_field, decimal_value, field_map, policy_period, status_guard, text_field, ClaimState,
    PolicyState, ProposalState, Subject,
};
use crate::status::{ClaimStatus, PolicyStatus, ProposalStatus};
use crate::validation::{
    append_note, validate_date_of_loss, validate_proposal, validate_reason,
    validate_survey_assignment, validate_waiting_period, ClaimIntake, ClaimLimits, PolicyPayment,
};

/// Outcome of one claim in a bulk survey assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentResult {
    Assigned { claim: String },
    /// The claim changed between read and write
    Conflict { claim: String, message: String },
    Failed { claim: String, message: String },
}

impl AssignmentResult {
    pub fn claim(&self) -> &str {
        match self {
            AssignmentResult::Assigned { claim }
            | AssignmentResult::Conflict { claim, .. }
            | AssignmentResult::Failed { claim, .. } => claim,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, AssignmentResult::Assigned { .. })
    }
}

/// A claim left out of a bulk assignment because it was not Reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedClaim {
    pub claim: String,
    pub status: String,
}

/// Per-item report of a bulk survey assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkAssignmentReport {
    pub results: Vec<AssignmentResult>,
    pub excluded: Vec<ExcludedClaim>,
}

impl BulkAssignmentReport {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_assigned()).count()
    }

    pub fn message(&self) -> String {
        format!("{} Claims successfully moved to Survey", self.success_count())
    }
}

fn procedure_error(procedure: &'static str) -> impl FnOnce(PortError) -> WorkflowError {
    move |error| match error {
        PortError::Conflict { .. } | PortError::Validation { .. } | PortError::NotFound { .. } => {
            error.into()
        }
        other => WorkflowError::Procedure {
            procedure: procedure.to_string(),
            message: other.to_string(),
        },
    }
}

/// Executes gated actions against the document store
pub struct WorkflowService {
    store: Arc<dyn DocumentStore>,
    procedures: Arc<dyn ServerProcedures>,
    claim_limits: ClaimLimits,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn DocumentStore>, procedures: Arc<dyn ServerProcedures>) -> Self {
        Self {
            store,
            procedures,
            claim_limits: ClaimLimits::default(),
        }
    }

    pub fn with_claim_limits(mut self, limits: ClaimLimits) -> Self {
        self.claim_limits = limits;
        self
    }

    /// Rating terms of a stored plan
    pub async fn plan(&self, name: &str) -> Result<InsurancePlan, WorkflowError> {
        let doc = self.store.get(DocType::Plan, name).await?;
        InsurancePlan::from_document(&doc)
    }

    /// Quotes the premium for cover under `plan`
    #[instrument(skip(self, addons))]
    pub async fn quote_premium(
        &self,
        plan: &str,
        idv: Decimal,
        addons: &[String],
        ncb_percent: Decimal,
    ) -> Result<PremiumQuote, WorkflowError> {
        let quote = self.plan(plan).await?.quote(idv, addons, ncb_percent)?;
        debug!(plan, grand_total = %quote.grand_total_premium, "Premium quoted");
        Ok(quote)
    }

    /// Waiting period of the policy's plan; a policy without a stored plan has none
    async fn waiting_period_days(&self, policy: &Document) -> Result<u32, WorkflowError> {
        let Some(plan) = text_field(policy, "insurance_plan") else {
            return Ok(0);
        };
        match self.plan(plan).await {
            Ok(plan) => Ok(plan.waiting_period_days),
            Err(WorkflowError::NotFound(_)) => {
                debug!(policy = %policy.name, plan, "Plan not stored, no waiting period applies");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Claims against `policy` that still count towards its limit
    async fn open_claims(&self, policy: &str) -> Result<usize, WorkflowError> {
        let claims = self
            .store
            .list(&DocumentQuery::new(DocType::Claim).filter("policy", policy))
            .await?;
        Ok(claims
            .iter()
            .filter(|c| text_field(c, "status") != Some(ClaimStatus::Rejected.label()))
            .count())
    }

    async fn has_submitted_payment(&self, proposal: &str) -> Result<bool, WorkflowError> {
        let query = DocumentQuery::new(DocType::PaymentEntry)
            .filter("reference_doctype", DocType::Proposal.as_str())
            .filter("reference_name", proposal)
            .filter("docstatus", DocStatus::Submitted)
            .limit(1);
        Ok(!self.store.list(&query).await?.is_empty())
    }

    async fn load(&self, doctype: DocType, name: &str) -> Result<(Document, Subject), WorkflowError> {
        let doc = self.store.get(doctype, name).await?;
        let subject = match doctype {
            DocType::Proposal => {
                let paid = self.has_submitted_payment(name).await?;
                Subject::Proposal(ProposalState::from_document(&doc, paid)?)
            }
            DocType::Policy => Subject::Policy(PolicyState::from_document(&doc)?),
            DocType::Claim => Subject::Claim(ClaimState::from_document(&doc)?),
            other => {
                return Err(WorkflowError::InvalidDocument(format!(
                    "{} has no workflow",
                    other
                )))
            }
        };
        Ok((doc, subject))
    }

    async fn write(
        &self,
        doc: &Document,
        preconditions: &[Precondition],
        updates: FieldMap,
    ) -> Result<Document, WorkflowError> {
        self.store
            .set_fields_if(doc.doctype, &doc.name, preconditions, updates)
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    warn!(doctype = %doc.doctype, name = %doc.name, "Conditional write lost");
                    WorkflowError::conflict(format!(
                        "{} {} was modified by someone else. Reload and try again.",
                        doc.doctype, doc.name
                    ))
                } else {
                    e.into()
                }
            })
    }

    /// Actions currently available for a proposal, policy or claim
    pub async fn available_actions(
        &self,
        doctype: DocType,
        name: &str,
    ) -> Result<Vec<ActionDescriptor>, WorkflowError> {
        let (_, subject) = self.load(doctype, name).await?;
        Ok(gate(&subject))
    }

    // --- proposals ---

    /// Moves a proposal to Under Review
    ///
    /// The proposal must be complete and its vehicle insurable on `today`.
    #[instrument(skip(self, metadata))]
    pub async fn submit_for_review(
        &self,
        name: &str,
        today: NaiveDate,
        metadata: Option<OperationMetadata>,
    ) -> Result<Document, WorkflowError> {
        let (doc, subject) = self.load(DocType::Proposal, name).await?;
        require(&subject, Action::SubmitForReview)?;
        validate_proposal(&doc)?;

        let vehicle = text_field(&doc, "vehicle")
            .ok_or_else(|| WorkflowError::validation("Vehicle is mandatory"))?;
        let vehicle = self
            .store
            .get(DocType::Vehicle, vehicle)
            .await?
            .decode::<Vehicle>()?;
        vehicle.ensure_insurable(today)?;

        let updated = self
            .write(
                &doc,
                &[status_guard(&doc)],
                field_map(json!({"status": ProposalStatus::UnderReview.label()})),
            )
            .await?;
        info!(proposal = name, actor = actor(&metadata), "Proposal submitted for review");
        Ok(updated)
    }

    #[instrument(skip(self, metadata))]
    pub async fn approve(
        &self,
        name: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<Document, WorkflowError> {
        let (doc, subject) = self.load(DocType::Proposal, name).await?;
        require(&subject, Action::Approve)?;

        let updated = self
            .write(
                &doc,
                &[status_guard(&doc)],
                field_map(json!({
                    "status": ProposalStatus::Approved.label(),
                    "docstatus": DocStatus::Submitted,
                })),
            )
            .await?;
        info!(proposal = name, actor = actor(&metadata), "Proposal approved");
        Ok(updated)
    }

    /// Rejects a proposal, recording the reason
    ///
    /// A blank reason fails before the proposal is read.
    #[instrument(skip(self, reason, metadata))]
    pub async fn reject(
        &self,
        name: &str,
        reason: Option<&str>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Document, WorkflowError> {
        let reason = validate_reason(reason)?;
        let (doc, subject) = self.load(DocType::Proposal, name).await?;
        require(&subject, Action::Reject)?;

        let notes = append_note(doc.get_str("notes"), &reason);
        let updated = self
            .write(
                &doc,
                &[status_guard(&doc), Precondition::version(doc.version)],
                field_map(json!({
                    "status": ProposalStatus::Rejected.label(),
                    "docstatus": DocStatus::Submitted,
                    "rejection_reason": reason,
                    "notes": notes,
                })),
            )
            .await?;
        info!(proposal = name, actor = actor(&metadata), "Proposal rejected");
        Ok(updated)
    }

    /// Creates the draft premium payment for an approved proposal
    #[instrument(skip(self, metadata))]
    pub async fn record_payment(
        &self,
        name: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, WorkflowError> {
        let (_, subject) = self.load(DocType::Proposal, name).await?;
        require(&subject, Action::RecordPayment)?;

        self.procedures
            .create_proposal_payment_entry(name, metadata)
            .await
            .map_err(procedure_error("create_proposal_payment_entry"))
    }

    /// Submits a draft payment entry
    #[instrument(skip(self, metadata))]
    pub async fn submit_payment(
        &self,
        payment_entry: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, WorkflowError> {
        self.procedures
            .submit_payment_entry(payment_entry, metadata)
            .await
            .map_err(procedure_error("submit_payment_entry"))
    }

    #[instrument(skip(self, metadata))]
    pub async fn convert_to_policy(
        &self,
        name: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, WorkflowError> {
        let (_, subject) = self.load(DocType::Proposal, name).await?;
        require(&subject, Action::ConvertToPolicy)?;

        let policy = self
            .procedures
            .create_policy_from_proposal(name, metadata)
            .await
            .map_err(procedure_error("create_policy_from_proposal"))?;
        info!(proposal = name, policy = %policy.name, "Proposal converted");
        Ok(policy)
    }

    // --- policies ---

    /// Coverage period of a policy, for checking a date of loss as it is entered
    pub async fn policy_coverage(&self, name: &str) -> Result<CoveragePeriod, WorkflowError> {
        let doc = self.store.get(DocType::Policy, name).await?;
        policy_period(&doc)
    }

    #[instrument(skip(self, payment, metadata))]
    pub async fn record_policy_payment(
        &self,
        name: &str,
        payment: &PolicyPayment,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, WorkflowError> {
        payment.validate()?;
        let (_, subject) = self.load(DocType::Policy, name).await?;
        require(&subject, Action::RecordPayment)?;

        self.procedures
            .record_policy_payment(name, payment, metadata)
            .await
            .map_err(procedure_error("record_policy_payment"))
    }

    #[instrument(skip(self, metadata))]
    pub async fn cancel_policy(
        &self,
        name: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<Document, WorkflowError> {
        let (doc, subject) = self.load(DocType::Policy, name).await?;
        require(&subject, Action::CancelPolicy)?;

        let updated = self
            .write(
                &doc,
                &[status_guard(&doc)],
                field_map(json!({"status": PolicyStatus::Cancelled.label()})),
            )
            .await?;
        info!(policy = name, actor = actor(&metadata), "Policy cancelled");
        Ok(updated)
    }

    /// Registers a claim against a policy
    ///
    /// The date of loss is checked against the stored coverage again, so an
    /// intake prepared against a stale period is still refused. The plan's
    /// waiting period and the configured claim limits are enforced before
    /// anything is written. A policy without an IDV has no amount limit.
    #[instrument(skip(self, intake, metadata))]
    pub async fn create_claim(
        &self,
        policy: &str,
        intake: &ClaimIntake,
        metadata: Option<OperationMetadata>,
    ) -> Result<Document, WorkflowError> {
        let date_of_loss = intake.validate()?;
        let (doc, subject) = self.load(DocType::Policy, policy).await?;
        require(&subject, Action::CreateClaim)?;
        let period = policy_period(&doc)?;
        validate_date_of_loss(date_of_loss, &period)?;
        validate_waiting_period(date_of_loss, &period, self.waiting_period_days(&doc).await?)?;

        self.claim_limits.check_count(self.open_claims(policy).await?)?;
        let idv = decimal_field(&doc, "vehicle_idv")?.filter(|idv| *idv > Decimal::ZERO);
        if let (Some(amount), Some(idv)) = (intake.claim_amount, idv) {
            self.claim_limits.check_amount(amount, idv)?;
        }

        let copy = |field: &str| doc.get(field).cloned().unwrap_or(Value::Null);
        let mut fields = field_map(json!({
            "status": ClaimStatus::Reported.label(),
            "docstatus": DocStatus::Draft,
            "policy": policy,
            "policy_number": doc.get("policy_number").cloned().unwrap_or_else(|| Value::from(policy)),
            "customer": copy("customer"),
            "vehicle": copy("vehicle"),
            "insurance_plan": copy("insurance_plan"),
            "date_of_loss": date_of_loss.to_string(),
            "owner": actor(&metadata),
        }));
        if let Some(amount) = intake.claim_amount {
            fields.insert("claim_amount".into(), decimal_value(amount));
        }
        if let Some(description) = intake.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            fields.insert("description".into(), Value::from(description));
        }

        let name = ClaimName::generate().into_inner();
        let claim = self
            .store
            .insert(DocType::Claim, &name, fields)
            .await?;
        info!(policy, claim = %claim.name, %date_of_loss, "Claim reported");
        Ok(claim)
    }

    // --- claims ---

    #[instrument(skip(self, metadata))]
    pub async fn create_settlement(
        &self,
        name: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ArtifactRef, WorkflowError> {
        let (_, subject) = self.load(DocType::Claim, name).await?;
        require(&subject, Action::CreateSettlement)?;

        self.procedures
            .create_settlement_journal_entry(name, metadata)
            .await
            .map_err(procedure_error("create_settlement_journal_entry"))
    }

    /// Moves a claim one step along its lifecycle
    ///
    /// Settlement and survey assignment have their own executors and are
    /// refused here. Approving may record the approved amount.
    #[instrument(skip(self, metadata))]
    pub async fn advance_claim(
        &self,
        name: &str,
        target: ClaimStatus,
        approved_amount: Option<Decimal>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Document, WorkflowError> {
        match target {
            ClaimStatus::Settled => {
                return Err(WorkflowError::validation(
                    "Claims are settled through Create Settlement",
                ))
            }
            ClaimStatus::SurveyAssigned => {
                return Err(WorkflowError::validation(
                    "Use Assign Surveyor to move claims to Survey",
                ))
            }
            _ => {}
        }

        let doc = self.store.get(DocType::Claim, name).await?;
        let state = ClaimState::from_document(&doc)?;
        if !state.status.can_advance_to(target) {
            return Err(WorkflowError::ActionNotPermitted {
                action: format!("Move to {}", target),
                entity: DocType::Claim.to_string(),
                status: state.status.to_string(),
            });
        }

        let mut updates = field_map(json!({"status": target.label()}));
        if target == ClaimStatus::Approved {
            let amount = match approved_amount {
                Some(amount) => Some(amount),
                None => decimal_field(&doc, "claim_amount")?,
            };
            match amount {
                Some(amount) if amount > Decimal::ZERO => {
                    updates.insert("approved_amount".into(), decimal_value(amount));
                }
                _ => return Err(WorkflowError::validation("Approved Amount must be positive")),
            }
        }

        let updated = self.write(&doc, &[status_guard(&doc)], updates).await?;
        info!(claim = name, from = %state.status, to = %target, actor = actor(&metadata), "Claim advanced");
        Ok(updated)
    }

    /// Assigns a surveyor to every Reported claim in `claims`
    ///
    /// Claims in any other status are reported as excluded. Each Reported
    /// claim is written independently, so one lost write does not undo the
    /// others.
    #[instrument(skip(self, claims, metadata), fields(selected = claims.len()))]
    pub async fn assign_surveyor(
        &self,
        claims: &[String],
        surveyor: &str,
        survey_date: Option<NaiveDate>,
        metadata: Option<OperationMetadata>,
    ) -> Result<BulkAssignmentReport, WorkflowError> {
        validate_survey_assignment(claims, surveyor)?;
        let surveyor = surveyor.trim();

        let mut report = BulkAssignmentReport::default();
        let mut reported = Vec::new();

        let mut seen = HashSet::new();
        for name in claims.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
            if !seen.insert(name) {
                continue;
            }
            let doc = match self.store.get(DocType::Claim, name).await {
                Ok(doc) => doc,
                Err(e) => {
                    report.results.push(AssignmentResult::Failed {
                        claim: name.to_string(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            match ClaimState::from_document(&doc) {
                Ok(state) if state.status == ClaimStatus::Reported => reported.push(doc),
                Ok(state) => report.excluded.push(ExcludedClaim {
                    claim: name.to_string(),
                    status: state.status.to_string(),
                }),
                Err(e) => report.results.push(AssignmentResult::Failed {
                    claim: name.to_string(),
                    message: e.to_string(),
                }),
            }
        }

        if reported.is_empty() {
            return Err(WorkflowError::validation(
                "Only claims in 'Reported' status can be moved to Survey",
            ));
        }

        let mut updates = field_map(json!({
            "status": ClaimStatus::SurveyAssigned.label(),
            "surveyor": surveyor,
        }));
        if let Some(date) = survey_date {
            updates.insert("survey_date".into(), Value::from(date.to_string()));
        }

        for doc in reported {
            let result = match self.write(&doc, &[status_guard(&doc)], updates.clone()).await {
                Ok(_) => AssignmentResult::Assigned { claim: doc.name.clone() },
                Err(WorkflowError::Conflict(message)) => AssignmentResult::Conflict {
                    claim: doc.name.clone(),
                    message,
                },
                Err(e) => AssignmentResult::Failed {
                    claim: doc.name.clone(),
                    message: e.to_string(),
                },
            };
            report.results.push(result);
        }

        info!(
            surveyor,
            assigned = report.success_count(),
            excluded = report.excluded.len(),
            actor = actor(&metadata),
            "Survey assignment finished"
        );
        Ok(report)
    }
}

fn actor(metadata: &Option<OperationMetadata>) -> &str {
    metadata.as_ref().map_or("system", |m| m.actor())
}
