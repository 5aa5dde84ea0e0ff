//! Document model
//!
//! Every business record (proposal, policy, claim, vehicle, plan, payment
//! entry, journal entry) is stored as a named document holding a JSON object of
//! fields. Domain crates decode the fields into typed records; writes go
//! through [`crate::ports::DocumentStore::set_fields_if`] so that every
//! change is checked against the state it was computed from.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::ports::PortError;

/// JSON object holding a document's fields
pub type FieldMap = Map<String, Value>;

/// The kinds of documents the system stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "Insurance Proposal")]
    Proposal,
    #[serde(rename = "Insurance Policy")]
    Policy,
    #[serde(rename = "Insurance Claim")]
    Claim,
    #[serde(rename = "Vehicle")]
    Vehicle,
    #[serde(rename = "Payment Entry")]
    PaymentEntry,
    #[serde(rename = "Journal Entry")]
    JournalEntry,
    #[serde(rename = "Insurance Plan")]
    Plan,
}

impl DocType {
    /// Returns the stored label of the document type
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Proposal => "Insurance Proposal",
            DocType::Policy => "Insurance Policy",
            DocType::Claim => "Insurance Claim",
            DocType::Vehicle => "Vehicle",
            DocType::PaymentEntry => "Payment Entry",
            DocType::JournalEntry => "Journal Entry",
            DocType::Plan => "Insurance Plan",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Insurance Proposal" => Ok(DocType::Proposal),
            "Insurance Policy" => Ok(DocType::Policy),
            "Insurance Claim" => Ok(DocType::Claim),
            "Vehicle" => Ok(DocType::Vehicle),
            "Payment Entry" => Ok(DocType::PaymentEntry),
            "Journal Entry" => Ok(DocType::JournalEntry),
            "Insurance Plan" => Ok(DocType::Plan),
            other => Err(PortError::Transformation {
                message: format!("Unknown document type: {}", other),
            }),
        }
    }
}

/// Submission state of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DocStatus {
    /// Saved but not submitted
    #[default]
    Draft,
    /// Submitted and locked
    Submitted,
    /// Submitted then cancelled
    Cancelled,
}

impl DocStatus {
    pub fn as_u8(self) -> u8 {
        match self {
            DocStatus::Draft => 0,
            DocStatus::Submitted => 1,
            DocStatus::Cancelled => 2,
        }
    }

    pub fn is_submitted(self) -> bool {
        self == DocStatus::Submitted
    }
}

impl TryFrom<u8> for DocStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DocStatus::Draft),
            1 => Ok(DocStatus::Submitted),
            2 => Ok(DocStatus::Cancelled),
            other => Err(format!("Invalid docstatus: {}", other)),
        }
    }
}

impl From<DocStatus> for u8 {
    fn from(status: DocStatus) -> u8 {
        status.as_u8()
    }
}

impl From<DocStatus> for Value {
    fn from(status: DocStatus) -> Value {
        Value::from(status.as_u8())
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doctype: DocType,
    pub name: String,
    /// Incremented on every successful write
    pub version: u64,
    pub fields: FieldMap,
    pub modified: DateTime<Utc>,
}

impl Document {
    /// Creates a fresh, unsaved document at version 1
    pub fn new(doctype: DocType, name: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            doctype,
            name: name.into(),
            version: 1,
            fields,
            modified: Utc::now(),
        }
    }

    /// Returns a field value, treating JSON null as absent
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    /// Returns a string field
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Returns the document's submission state (draft when unset)
    pub fn docstatus(&self) -> DocStatus {
        self.get("docstatus")
            .and_then(Value::as_u64)
            .and_then(|v| u8::try_from(v).ok())
            .and_then(|v| DocStatus::try_from(v).ok())
            .unwrap_or_default()
    }

    /// Decodes the fields into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, PortError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            PortError::Transformation {
                message: format!("{} {}: {}", self.doctype, self.name, e),
            }
        })
    }

    /// Returns true if every precondition holds against this document
    pub fn satisfies(&self, preconditions: &[Precondition]) -> bool {
        preconditions.iter().all(|p| p.holds(self))
    }

    /// Merges updates into the fields and bumps the version
    pub fn apply(&mut self, updates: FieldMap) {
        for (key, value) in updates {
            self.fields.insert(key, value);
        }
        self.version += 1;
        self.modified = Utc::now();
    }
}

/// A condition a document must satisfy for a conditional write to proceed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Precondition {
    /// The field holds exactly this value
    FieldEquals { field: String, value: Value },
    /// The field is missing or null
    FieldAbsent { field: String },
    /// The document is still at this version
    Version { version: u64 },
}

impl Precondition {
    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Precondition::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field_absent(field: impl Into<String>) -> Self {
        Precondition::FieldAbsent { field: field.into() }
    }

    pub fn version(version: u64) -> Self {
        Precondition::Version { version }
    }

    /// Evaluates the precondition against a document
    pub fn holds(&self, document: &Document) -> bool {
        match self {
            Precondition::FieldEquals { field, value } => {
                document.fields.get(field).unwrap_or(&Value::Null) == value
            }
            Precondition::FieldAbsent { field } => document.get(field).is_none(),
            Precondition::Version { version } => document.version == *version,
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::FieldEquals { field, value } => write!(f, "{} = {}", field, value),
            Precondition::FieldAbsent { field } => write!(f, "{} is empty", field),
            Precondition::Version { version } => write!(f, "version = {}", version),
        }
    }
}

/// Equality query over documents of one type
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub doctype: DocType,
    /// Field equality filters, all of which must match
    pub filters: FieldMap,
    pub limit: Option<u32>,
}

impl DocumentQuery {
    pub fn new(doctype: DocType) -> Self {
        Self {
            doctype,
            filters: FieldMap::new(),
            limit: None,
        }
    }

    /// Adds an equality filter
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the document matches every filter
    pub fn matches(&self, document: &Document) -> bool {
        document.doctype == self.doctype
            && self
                .filters
                .iter()
                .all(|(field, value)| document.fields.get(field).unwrap_or(&Value::Null) == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claim(fields: Value) -> Document {
        let Value::Object(map) = fields else { panic!("object expected") };
        Document::new(DocType::Claim, "CLM-1", map)
    }

    #[test]
    fn test_field_absent_treats_null_as_absent() {
        let doc = claim(json!({"status": "Approved", "settlement_journal_entry": null}));
        assert!(Precondition::field_absent("settlement_journal_entry").holds(&doc));
        assert!(Precondition::field_absent("missing").holds(&doc));
        assert!(!Precondition::field_absent("status").holds(&doc));
    }

    #[test]
    fn test_apply_bumps_version() {
        let mut doc = claim(json!({"status": "Reported"}));
        let mut updates = FieldMap::new();
        updates.insert("status".into(), json!("Survey Assigned"));
        doc.apply(updates);
        assert_eq!(doc.version, 2);
        assert_eq!(doc.get_str("status"), Some("Survey Assigned"));
    }

    #[test]
    fn test_docstatus_defaults_to_draft() {
        let doc = claim(json!({}));
        assert_eq!(doc.docstatus(), DocStatus::Draft);
        let doc = claim(json!({"docstatus": 1}));
        assert_eq!(doc.docstatus(), DocStatus::Submitted);
    }

    #[test]
    fn test_doctype_round_trips_through_label() {
        for doctype in [DocType::Proposal, DocType::Policy, DocType::Claim, DocType::Vehicle, DocType::Plan] {
            assert_eq!(doctype.as_str().parse::<DocType>().unwrap(), doctype);
        }
    }
}
