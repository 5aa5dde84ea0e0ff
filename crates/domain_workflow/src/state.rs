//! Entity state snapshots
//!
//! The gate never looks at documents directly. A snapshot carries exactly
//! the facts a gating decision depends on, read from the store at one point
//! in time.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use core_kernel::{CoveragePeriod, DocStatus, DocType, Document, FieldMap, Precondition};

use crate::error::WorkflowError;
use crate::status::{ClaimStatus, PolicyStatus, ProposalStatus};

/// Reads a decimal stored as a JSON string or number
pub fn decimal_field(doc: &Document, field: &str) -> Result<Option<Decimal>, WorkflowError> {
    let parsed = match doc.get(field) {
        None => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim())),
        Some(Value::Number(n)) => {
            let text = n.to_string();
            Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text))
        }
        Some(other) => {
            return Err(WorkflowError::InvalidDocument(format!(
                "{} {}: '{}' is not a number: {}",
                doc.doctype, doc.name, field, other
            )))
        }
    };

    parsed.map(Some).map_err(|e| {
        WorkflowError::InvalidDocument(format!("{} {}: '{}': {}", doc.doctype, doc.name, field, e))
    })
}

/// Reads a `YYYY-MM-DD` date
pub fn date_field(doc: &Document, field: &str) -> Result<Option<NaiveDate>, WorkflowError> {
    match doc.get_str(field).map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) => {
            let prefix = text.get(..10).unwrap_or(text);
            NaiveDate::parse_from_str(prefix, "%Y-%m-%d").map(Some).map_err(|_| {
                WorkflowError::InvalidDocument(format!(
                    "{} {}: '{}' is not a date: {}",
                    doc.doctype, doc.name, field, text
                ))
            })
        }
    }
}

/// Reads a non-blank text field
pub fn text_field<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.get_str(field).map(str::trim).filter(|s| !s.is_empty())
}

fn status_of<S: FromStr<Err = WorkflowError>>(doc: &Document) -> Result<S, WorkflowError> {
    let label = text_field(doc, "status").ok_or_else(|| {
        WorkflowError::InvalidDocument(format!("{} {} has no status", doc.doctype, doc.name))
    })?;
    label.parse()
}

fn expect_doctype(doc: &Document, doctype: DocType) -> Result<(), WorkflowError> {
    if doc.doctype != doctype {
        return Err(WorkflowError::InvalidDocument(format!(
            "expected {}, got {} {}",
            doctype, doc.doctype, doc.name
        )));
    }
    Ok(())
}

/// Gating facts of a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalState {
    pub status: ProposalStatus,
    pub docstatus: DocStatus,
    /// A submitted payment entry references the proposal
    pub has_submitted_payment: bool,
    /// Policy already issued from the proposal
    pub policy: Option<String>,
}

impl ProposalState {
    pub fn new(status: ProposalStatus, docstatus: DocStatus) -> Self {
        Self {
            status,
            docstatus,
            has_submitted_payment: false,
            policy: None,
        }
    }

    pub fn with_submitted_payment(mut self, paid: bool) -> Self {
        self.has_submitted_payment = paid;
        self
    }

    /// Reads the snapshot; payment facts come from a separate query
    pub fn from_document(doc: &Document, has_submitted_payment: bool) -> Result<Self, WorkflowError> {
        expect_doctype(doc, DocType::Proposal)?;
        Ok(Self {
            status: status_of(doc)?,
            docstatus: doc.docstatus(),
            has_submitted_payment,
            policy: text_field(doc, "policy").map(str::to_string),
        })
    }
}

/// Gating facts of a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyState {
    pub status: PolicyStatus,
    pub docstatus: DocStatus,
    pub outstanding_amount: Decimal,
}

impl PolicyState {
    pub fn new(status: PolicyStatus, docstatus: DocStatus, outstanding_amount: Decimal) -> Self {
        Self {
            status,
            docstatus,
            outstanding_amount,
        }
    }

    pub fn from_document(doc: &Document) -> Result<Self, WorkflowError> {
        expect_doctype(doc, DocType::Policy)?;
        Ok(Self {
            status: status_of(doc)?,
            docstatus: doc.docstatus(),
            outstanding_amount: decimal_field(doc, "outstanding_amount")?.unwrap_or_default(),
        })
    }
}

/// Gating facts of a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimState {
    pub status: ClaimStatus,
    pub settlement_journal_entry: Option<String>,
}

impl ClaimState {
    pub fn new(status: ClaimStatus) -> Self {
        Self {
            status,
            settlement_journal_entry: None,
        }
    }

    pub fn with_settlement_entry(mut self, journal_entry: impl Into<String>) -> Self {
        self.settlement_journal_entry = Some(journal_entry.into());
        self
    }

    pub fn from_document(doc: &Document) -> Result<Self, WorkflowError> {
        expect_doctype(doc, DocType::Claim)?;
        Ok(Self {
            status: status_of(doc)?,
            settlement_journal_entry: text_field(doc, "settlement_journal_entry").map(str::to_string),
        })
    }
}

/// A snapshot of any gated entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Subject {
    Proposal(ProposalState),
    Policy(PolicyState),
    Claim(ClaimState),
}

impl Subject {
    pub fn doctype(&self) -> DocType {
        match self {
            Subject::Proposal(_) => DocType::Proposal,
            Subject::Policy(_) => DocType::Policy,
            Subject::Claim(_) => DocType::Claim,
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            Subject::Proposal(state) => state.status.label(),
            Subject::Policy(state) => state.status.label(),
            Subject::Claim(state) => state.status.label(),
        }
    }
}

/// Precondition that the stored status is still what was read
pub(crate) fn status_guard(doc: &Document) -> Precondition {
    Precondition::field_equals("status", doc.fields.get("status").cloned().unwrap_or(Value::Null))
}

/// Converts a `json!` object literal into a field map
pub(crate) fn field_map(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        _ => FieldMap::new(),
    }
}

/// Stores a decimal as its exact string form
pub(crate) fn decimal_value(value: Decimal) -> Value {
    Value::String(value.to_string())
}

/// Coverage period stored on a policy
pub fn policy_period(doc: &Document) -> Result<CoveragePeriod, WorkflowError> {
    CoveragePeriod::from_bounds(
        date_field(doc, "policy_start_date")?,
        date_field(doc, "policy_end_date")?,
    )
    .map_err(|e| WorkflowError::InvalidDocument(format!("{} {}: {}", doc.doctype, doc.name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(doctype: DocType, fields: Value) -> Document {
        let Value::Object(map) = fields else { panic!("object expected") };
        Document::new(doctype, "DOC-1", map)
    }

    #[test]
    fn test_decimal_accepts_strings_and_numbers() {
        let d = doc(DocType::Policy, json!({"a": "1250.50", "b": 300, "c": 12.5, "d": ""}));
        assert_eq!(decimal_field(&d, "a").unwrap(), Some(Decimal::new(125050, 2)));
        assert_eq!(decimal_field(&d, "b").unwrap(), Some(Decimal::from(300)));
        assert_eq!(decimal_field(&d, "c").unwrap(), Some(Decimal::new(125, 1)));
        assert_eq!(decimal_field(&d, "d").unwrap(), None);
        assert_eq!(decimal_field(&d, "missing").unwrap(), None);
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        let d = doc(DocType::Policy, json!({"a": "lots", "b": true}));
        assert!(decimal_field(&d, "a").is_err());
        assert!(decimal_field(&d, "b").is_err());
    }

    #[test]
    fn test_date_field_accepts_timestamp_prefix() {
        let d = doc(DocType::Claim, json!({"date_of_loss": "2026-03-15 10:30:00"}));
        assert_eq!(
            date_field(&d, "date_of_loss").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 15)
        );
    }

    #[test]
    fn test_claim_state_reads_alias_and_entry() {
        let d = doc(
            DocType::Claim,
            json!({"status": "Surveyor Appointed", "settlement_journal_entry": null}),
        );
        let state = ClaimState::from_document(&d).unwrap();
        assert_eq!(state.status, ClaimStatus::SurveyAssigned);
        assert_eq!(state.settlement_journal_entry, None);
    }

    #[test]
    fn test_policy_state_defaults_outstanding_to_zero() {
        let d = doc(DocType::Policy, json!({"status": "Active", "docstatus": 1}));
        let state = PolicyState::from_document(&d).unwrap();
        assert_eq!(state.outstanding_amount, Decimal::ZERO);
        assert_eq!(state.docstatus, DocStatus::Submitted);
    }

    #[test]
    fn test_wrong_doctype_rejected() {
        let d = doc(DocType::Claim, json!({"status": "Reported"}));
        assert!(matches!(
            PolicyState::from_document(&d),
            Err(WorkflowError::InvalidDocument(_))
        ));
    }
}
