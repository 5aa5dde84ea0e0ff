//! Input validation
//!
//! Every check here runs before the store is touched, so a failed
//! validation never leaves a partial effect.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CoveragePeriod, Document};

use crate::error::WorkflowError;
use crate::state::{date_field, decimal_field};

/// Returns the trimmed rejection reason
///
/// # Errors
///
/// Returns `WorkflowError::Validation` for a missing or blank reason
pub fn validate_reason(reason: Option<&str>) -> Result<String, WorkflowError> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .ok_or_else(|| WorkflowError::validation("A rejection reason is required"))
}

/// Checks that a loss date falls inside the policy's cover, both ends included
pub fn validate_date_of_loss(date: NaiveDate, period: &CoveragePeriod) -> Result<(), WorkflowError> {
    if !period.contains(date) {
        return Err(WorkflowError::validation(format!(
            "Date of Loss must be within the policy period ({} to {})",
            period.start, period.end
        )));
    }
    Ok(())
}

/// Appends a rejection reason to existing notes
pub fn append_note(notes: Option<&str>, reason: &str) -> String {
    let entry = format!("Rejection Reason: {}", reason);
    match notes.map(str::trim_end).filter(|n| !n.is_empty()) {
        Some(existing) => format!("{}\n{}", existing, entry),
        None => entry,
    }
}

/// Checks the fields a proposal needs before it goes to review
pub fn validate_proposal(doc: &Document) -> Result<(), WorkflowError> {
    let from = date_field(doc, "policy_duration_from")?;
    let to = date_field(doc, "policy_duration_to")?;
    match (from, to) {
        (Some(from), Some(to)) if to <= from => {
            return Err(WorkflowError::validation(
                "Policy Duration To must be after Policy Duration From",
            ))
        }
        (Some(_), Some(_)) => {}
        _ => return Err(WorkflowError::validation("Policy Duration From and To are mandatory")),
    }

    match decimal_field(doc, "vehicle_idv")? {
        Some(idv) if idv > Decimal::ZERO => Ok(()),
        _ => Err(WorkflowError::validation("Vehicle IDV must be a positive value")),
    }
}

/// Input for a new claim
///
/// The date of loss is checked as soon as it is entered; an out-of-period
/// date is discarded rather than kept and flagged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClaimIntake {
    date_of_loss: Option<NaiveDate>,
    pub claim_amount: Option<Decimal>,
    pub description: Option<String>,
}

impl ClaimIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_of_loss(&self) -> Option<NaiveDate> {
        self.date_of_loss
    }

    /// Sets the date of loss, clearing it if it lies outside `period`
    pub fn set_date_of_loss(&mut self, date: NaiveDate, period: &CoveragePeriod) -> Result<(), WorkflowError> {
        match validate_date_of_loss(date, period) {
            Ok(()) => {
                self.date_of_loss = Some(date);
                Ok(())
            }
            Err(e) => {
                self.date_of_loss = None;
                Err(e)
            }
        }
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.claim_amount = Some(amount);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the intake is complete
    pub fn validate(&self) -> Result<NaiveDate, WorkflowError> {
        if let Some(amount) = self.claim_amount {
            if amount <= Decimal::ZERO {
                return Err(WorkflowError::validation("Claim amount must be positive"));
            }
        }
        self.date_of_loss
            .ok_or_else(|| WorkflowError::validation("Date of Loss is required"))
    }
}

/// Per-policy limits checked when a claim is registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimLimits {
    /// Claims a policy may carry, not counting rejected ones
    pub max_claims_per_policy: usize,
    /// Largest claim as a percentage of the policy's IDV
    pub max_claim_percent_of_idv: Decimal,
}

impl Default for ClaimLimits {
    fn default() -> Self {
        Self {
            max_claims_per_policy: 999,
            max_claim_percent_of_idv: Decimal::ONE_HUNDRED,
        }
    }
}

impl ClaimLimits {
    pub fn new(max_claims_per_policy: usize, max_claim_percent_of_idv: Decimal) -> Self {
        Self {
            max_claims_per_policy,
            max_claim_percent_of_idv,
        }
    }

    /// Checks there is room for one more claim next to `open_claims`
    pub fn check_count(&self, open_claims: usize) -> Result<(), WorkflowError> {
        if open_claims >= self.max_claims_per_policy {
            return Err(WorkflowError::validation(format!(
                "Maximum claims per policy ({}) reached.",
                self.max_claims_per_policy
            )));
        }
        Ok(())
    }

    /// Checks a claim amount against the share of `idv` a claim may take
    pub fn check_amount(&self, amount: Decimal, idv: Decimal) -> Result<(), WorkflowError> {
        let max_allowed = idv * self.max_claim_percent_of_idv / Decimal::ONE_HUNDRED;
        if amount > max_allowed {
            return Err(WorkflowError::validation(format!(
                "Claim amount exceeds allowed limit ({}% of IDV). Max allowed: {}",
                self.max_claim_percent_of_idv.normalize(),
                max_allowed.round_dp(2).normalize()
            )));
        }
        Ok(())
    }
}

/// Checks a loss does not fall inside the plan's waiting period
///
/// A loss exactly `waiting_days` after the start of cover is accepted.
pub fn validate_waiting_period(
    date_of_loss: NaiveDate,
    period: &CoveragePeriod,
    waiting_days: u32,
) -> Result<(), WorkflowError> {
    if (date_of_loss - period.start).num_days() < i64::from(waiting_days) {
        return Err(WorkflowError::validation(format!(
            "Claim filed within waiting period of {} days.",
            waiting_days
        )));
    }
    Ok(())
}

/// A premium payment against a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyPayment {
    pub amount: Decimal,
    pub mode_of_payment: String,
    /// Bank or cash account receiving the payment
    pub paid_to: String,
    pub reference_no: Option<String>,
    pub reference_date: Option<NaiveDate>,
}

impl PolicyPayment {
    pub fn new(amount: Decimal, mode_of_payment: impl Into<String>, paid_to: impl Into<String>) -> Self {
        Self {
            amount,
            mode_of_payment: mode_of_payment.into(),
            paid_to: paid_to.into(),
            reference_no: None,
            reference_date: None,
        }
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.amount <= Decimal::ZERO {
            return Err(WorkflowError::validation("Payment amount must be positive"));
        }
        if self.mode_of_payment.trim().is_empty() {
            return Err(WorkflowError::validation("Mode of Payment is required"));
        }
        if self.paid_to.trim().is_empty() {
            return Err(WorkflowError::validation("Paid To Account is required"));
        }
        Ok(())
    }
}

/// Checks a bulk survey assignment request before any claim is read
pub fn validate_survey_assignment(claims: &[String], surveyor: &str) -> Result<(), WorkflowError> {
    if claims.iter().all(|c| c.trim().is_empty()) {
        return Err(WorkflowError::validation("Please select at least one claim"));
    }
    if surveyor.trim().is_empty() {
        return Err(WorkflowError::validation("Surveyor is required"));
    }
    Ok(())
}
