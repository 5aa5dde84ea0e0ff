//! Pre-built Test Fixtures
//!
//! Provides ready-to-use dates, registry payloads and store helpers. These
//! fixtures are fixed values so tests stay predictable.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{CoveragePeriod, Document, FieldMap};
use infra_store::InMemoryDocumentStore;
use serde_json::{json, Value};

/// Converts a JSON object literal into a field map
///
/// # Panics
///
/// Panics if `value` is not a JSON object
pub fn fields(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// Creates an in-memory store holding the given documents
pub async fn seeded_store(documents: Vec<Document>) -> Arc<InMemoryDocumentStore> {
    Arc::new(InMemoryDocumentStore::with_documents(documents).await)
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard policy start date (Jan 1, 2026)
    pub fn policy_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    /// Standard policy end date (Dec 31, 2026)
    pub fn policy_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
    }

    pub fn coverage_period() -> CoveragePeriod {
        CoveragePeriod::new(Self::policy_start(), Self::policy_end()).unwrap()
    }

    /// Standard loss date for claims
    pub fn loss_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    /// Day before cover starts
    pub fn before_policy() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
    }

    /// Day after cover ends
    pub fn after_policy() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()
    }

    /// Reference "today" for eligibility checks
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    /// RC expiry comfortably after `today`
    pub fn rc_expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2034, 3, 15).unwrap()
    }
}

/// Fixture for registry payloads
pub struct RegistryFixtures;

impl RegistryFixtures {
    pub fn registration_no() -> &'static str {
        "MH12AB1234"
    }

    /// Successful lookup body as the registry sends it
    pub fn success_body() -> String {
        json!({
            "reference_id": 93417,
            "status": "VALID",
            "reg_no": "MH12AB1234",
            "vehicle_chassis_number": "MA3EWDE1S00123456",
            "vehicle_engine_number": "K12MN1234567",
            "vehicle_manufacturer_name": "MARUTI SUZUKI INDIA LTD",
            "model": "SWIFT VXI",
            "vehicle_fuel_type": "PETROL/CNG HYBRID",
            "vehicle_class": "Motor Car(LMV)",
            "vehicle_manufacturing_month_year": "03/2019",
            "rc_status": "active",
            "vehicle_registration_date_expiry": "15-03-2034"
        })
        .to_string()
    }

    /// Lookup body for an unknown registration number
    pub fn not_found_body() -> String {
        json!({
            "code": "vehicle_not_found",
            "message": "Vehicle not found for the given registration number",
            "type": "validation_error"
        })
        .to_string()
    }
}

/// Fixture for principal roles
pub struct PrincipalFixtures;

impl PrincipalFixtures {
    pub fn admin_roles() -> Vec<String> {
        vec!["System Manager".to_string()]
    }

    pub fn agent_roles() -> Vec<String> {
        vec!["Insurance Agent".to_string()]
    }

    pub fn underwriter_roles() -> Vec<String> {
        vec!["Insurance Underwriter".to_string()]
    }

    pub fn claims_officer_roles() -> Vec<String> {
        vec!["Claims Officer".to_string()]
    }

    pub fn finance_roles() -> Vec<String> {
        vec!["Finance & Accounts".to_string()]
    }
}
