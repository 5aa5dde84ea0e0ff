//! Test Data Builders
//!
//! Provides builders for the documents the workflow reads. Each builder
//! starts from a consistent, valid record so tests only set the fields they
//! care about.

use chrono::NaiveDate;
use core_kernel::{DocStatus, DocType, Document, FieldMap};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::fixtures::TemporalFixtures;

fn decimal(value: Decimal) -> Value {
    Value::String(value.to_string())
}

fn date(value: NaiveDate) -> Value {
    Value::String(value.to_string())
}

/// Builder for an arbitrary document
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    doctype: DocType,
    name: String,
    version: u64,
    fields: FieldMap,
}

impl DocumentBuilder {
    pub fn new(doctype: DocType, name: impl Into<String>) -> Self {
        Self {
            doctype,
            name: name.into(),
            version: 1,
            fields: FieldMap::new(),
        }
    }

    /// Sets a field
    pub fn field(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Removes a field
    pub fn without(mut self, field: &str) -> Self {
        self.fields.remove(field);
        self
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(self) -> Document {
        let mut doc = Document::new(self.doctype, self.name, self.fields);
        doc.version = self.version;
        doc
    }
}

/// Builder for insurance proposals
#[derive(Debug, Clone)]
pub struct ProposalBuilder {
    inner: DocumentBuilder,
}

impl Default for ProposalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalBuilder {
    /// Draft proposal for the standard vehicle and coverage period
    pub fn new() -> Self {
        let inner = DocumentBuilder::new(DocType::Proposal, "PROP-2026-00001")
            .field("status", "Draft")
            .field("docstatus", DocStatus::Draft)
            .field("customer", "CUST-0001")
            .field("vehicle", "VEH-2026-00001")
            .field("insurance_plan", "Comprehensive Private Car")
            .field("vehicle_idv", decimal(dec!(550000)))
            .field("premium_amount", decimal(dec!(12500.00)))
            .field("policy_duration_from", date(TemporalFixtures::policy_start()))
            .field("policy_duration_to", date(TemporalFixtures::policy_end()));
        Self { inner }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.inner.name = name.to_string();
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.inner = self.inner.field("status", status);
        self
    }

    pub fn with_docstatus(mut self, docstatus: DocStatus) -> Self {
        self.inner = self.inner.field("docstatus", docstatus);
        self
    }

    /// Approved and submitted, ready for payment
    pub fn approved(self) -> Self {
        self.with_status("Approved").with_docstatus(DocStatus::Submitted)
    }

    pub fn with_vehicle(mut self, vehicle: &str) -> Self {
        self.inner = self.inner.field("vehicle", vehicle);
        self
    }

    pub fn with_premium(mut self, premium: Decimal) -> Self {
        self.inner = self.inner.field("premium_amount", decimal(premium));
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.inner = self.inner.field("notes", notes);
        self
    }

    pub fn with_field(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.inner = self.inner.field(field, value);
        self
    }

    pub fn build(self) -> Document {
        self.inner.build()
    }
}

/// Builder for insurance policies
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    inner: DocumentBuilder,
    premium: Decimal,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyBuilder {
    /// Active, submitted, fully paid policy over the standard period
    pub fn new() -> Self {
        let premium = dec!(12500.00);
        let inner = DocumentBuilder::new(DocType::Policy, "POL-2026-00001")
            .field("status", "Active")
            .field("docstatus", DocStatus::Submitted)
            .field("customer", "CUST-0001")
            .field("vehicle", "VEH-2026-00001")
            .field("insurance_proposal", "PROP-2026-00001")
            .field("insurance_plan", "Comprehensive Private Car")
            .field("vehicle_idv", decimal(dec!(550000)))
            .field("policy_start_date", date(TemporalFixtures::policy_start()))
            .field("policy_end_date", date(TemporalFixtures::policy_end()))
            .field("premium_amount", decimal(premium))
            .field("premium_paid", decimal(premium))
            .field("outstanding_amount", decimal(Decimal::ZERO));
        Self { inner, premium }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.inner.name = name.to_string();
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.inner = self.inner.field("status", status);
        self
    }

    pub fn with_docstatus(mut self, docstatus: DocStatus) -> Self {
        self.inner = self.inner.field("docstatus", docstatus);
        self
    }

    /// Sets the unpaid part of the premium
    pub fn with_outstanding(mut self, outstanding: Decimal) -> Self {
        self.inner = self
            .inner
            .field("premium_paid", decimal(self.premium - outstanding))
            .field("outstanding_amount", decimal(outstanding));
        self
    }

    /// Unpaid policy awaiting its premium
    pub fn pending_payment(self) -> Self {
        let premium = self.premium;
        self.with_status("Pending Payment").with_outstanding(premium)
    }

    pub fn with_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.inner = self
            .inner
            .field("policy_start_date", date(start))
            .field("policy_end_date", date(end));
        self
    }

    pub fn with_proposal(mut self, proposal: &str) -> Self {
        self.inner = self.inner.field("insurance_proposal", proposal);
        self
    }

    pub fn with_field(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.inner = self.inner.field(field, value);
        self
    }

    pub fn build(self) -> Document {
        self.inner.build()
    }
}

/// Builder for insurance claims
#[derive(Debug, Clone)]
pub struct ClaimBuilder {
    inner: DocumentBuilder,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    /// Reported claim against the standard policy
    pub fn new() -> Self {
        let inner = DocumentBuilder::new(DocType::Claim, "CLM-2026-00001")
            .field("status", "Reported")
            .field("docstatus", DocStatus::Draft)
            .field("policy", "POL-2026-00001")
            .field("customer", "CUST-0001")
            .field("vehicle", "VEH-2026-00001")
            .field("date_of_loss", date(TemporalFixtures::loss_date()))
            .field("claim_amount", decimal(dec!(85000.00)));
        Self { inner }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.inner.name = name.to_string();
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.inner = self.inner.field("status", status);
        self
    }

    /// Approved for the given amount
    pub fn approved(mut self, amount: Decimal) -> Self {
        self.inner = self
            .inner
            .field("status", "Approved")
            .field("approved_amount", decimal(amount));
        self
    }

    pub fn with_settlement_entry(mut self, journal_entry: &str) -> Self {
        self.inner = self.inner.field("settlement_journal_entry", journal_entry);
        self
    }

    pub fn with_policy(mut self, policy: &str) -> Self {
        self.inner = self.inner.field("policy", policy);
        self
    }

    pub fn with_field(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.inner = self.inner.field(field, value);
        self
    }

    pub fn build(self) -> Document {
        self.inner.build()
    }
}

/// Builder for vehicles
#[derive(Debug, Clone)]
pub struct VehicleBuilder {
    inner: DocumentBuilder,
}

impl Default for VehicleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleBuilder {
    /// Unverified vehicle with a registration number
    pub fn new() -> Self {
        let inner = DocumentBuilder::new(DocType::Vehicle, "VEH-2026-00001")
            .field("registration_no", "MH12AB1234")
            .field("make", "MARUTI SUZUKI")
            .field("model", "SWIFT")
            .field("fuel_type", "Petrol")
            .field("rc_verified", false);
        Self { inner }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.inner.name = name.to_string();
        self
    }

    pub fn with_registration(mut self, registration_no: &str) -> Self {
        self.inner = self.inner.field("registration_no", registration_no);
        self
    }

    pub fn without_registration(mut self) -> Self {
        self.inner = self.inner.without("registration_no");
        self
    }

    /// Verified with an active RC valid until the fixture expiry
    pub fn verified(mut self) -> Self {
        self.inner = self
            .inner
            .field("rc_verified", true)
            .field("rc_status", "ACTIVE")
            .field("rc_expiry_date", date(TemporalFixtures::rc_expiry()))
            .field("rc_api_reference_id", "93417")
            .field("rc_raw_response", "{}");
        self
    }

    pub fn with_rc_status(mut self, status: &str) -> Self {
        self.inner = self.inner.field("rc_status", status);
        self
    }

    pub fn with_rc_expiry(mut self, expiry: NaiveDate) -> Self {
        self.inner = self.inner.field("rc_expiry_date", date(expiry));
        self
    }

    pub fn with_field(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.inner = self.inner.field(field, value);
        self
    }

    pub fn build(self) -> Document {
        self.inner.build()
    }
}

/// Builder for insurance plans
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    inner: DocumentBuilder,
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanBuilder {
    /// The plan the standard policy is issued under, with no waiting period
    pub fn new() -> Self {
        let inner = DocumentBuilder::new(DocType::Plan, "Comprehensive Private Car")
            .field("od_rate_type", "Percentage")
            .field("od_rate_value", decimal(dec!(2.5)))
            .field("min_od_premium", decimal(dec!(2000)))
            .field("max_od_premium", decimal(dec!(20000)))
            .field("tp_premium_value", decimal(dec!(3416)))
            .field("gst_rate", decimal(dec!(18)))
            .field("waiting_period_days", 0)
            .field(
                "plan_addons",
                serde_json::json!([
                    {"addon": "Zero Depreciation", "pricing_type": "Percentage of IDV", "pricing_value": "0.4"},
                    {"addon": "Roadside Assistance", "pricing_type": "Flat", "pricing_value": "199"}
                ]),
            );
        Self { inner }
    }

    pub fn with_waiting_period(mut self, days: u32) -> Self {
        self.inner = self.inner.field("waiting_period_days", days);
        self
    }

    pub fn with_field(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.inner = self.inner.field(field, value);
        self
    }

    pub fn build(self) -> Document {
        self.inner.build()
    }
}

/// Builder for payment entries
#[derive(Debug, Clone)]
pub struct PaymentEntryBuilder {
    inner: DocumentBuilder,
}

impl PaymentEntryBuilder {
    /// Draft payment referencing a proposal or policy
    pub fn new(name: &str, reference_doctype: DocType, reference_name: &str) -> Self {
        let inner = DocumentBuilder::new(DocType::PaymentEntry, name)
            .field("reference_doctype", reference_doctype.as_str())
            .field("reference_name", reference_name)
            .field("reference_no", reference_name)
            .field("paid_amount", decimal(dec!(12500.00)))
            .field("docstatus", DocStatus::Draft);
        Self { inner }
    }

    pub fn submitted(mut self) -> Self {
        self.inner = self.inner.field("docstatus", DocStatus::Submitted);
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.inner = self.inner.field("paid_amount", decimal(amount));
        self
    }

    /// Free-text bank or cheque reference
    pub fn with_reference_no(mut self, reference_no: &str) -> Self {
        self.inner = self.inner.field("reference_no", reference_no);
        self
    }

    pub fn build(self) -> Document {
        self.inner.build()
    }
}
