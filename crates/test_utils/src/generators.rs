//! Property-Based Test Generators
//!
//! Provides proptest strategies for statuses, amounts, dates and registry
//! text.

use chrono::{Duration, NaiveDate};
use core_kernel::{CoveragePeriod, DocStatus};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Proposal status labels, including an unknown one
pub const PROPOSAL_STATUS_LABELS: [&str; 6] =
    ["Draft", "Submitted", "Under Review", "Approved", "Rejected", "Archived"];

/// Policy status labels, including an unknown one
pub const POLICY_STATUS_LABELS: [&str; 5] =
    ["Pending Payment", "Active", "Expired", "Cancelled", "Lapsed"];

/// Claim status labels, including the legacy alias and an unknown one
pub const CLAIM_STATUS_LABELS: [&str; 8] = [
    "Reported",
    "Survey Assigned",
    "Surveyor Appointed",
    "Survey Completed",
    "Approved",
    "Rejected",
    "Settled",
    "Withdrawn",
];

pub fn proposal_status_label_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(PROPOSAL_STATUS_LABELS.to_vec())
}

pub fn policy_status_label_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(POLICY_STATUS_LABELS.to_vec())
}

pub fn claim_status_label_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(CLAIM_STATUS_LABELS.to_vec())
}

pub fn docstatus_strategy() -> impl Strategy<Value = DocStatus> {
    prop_oneof![
        Just(DocStatus::Draft),
        Just(DocStatus::Submitted),
        Just(DocStatus::Cancelled),
    ]
}

/// Outstanding amounts, including zero and overpayments
pub fn outstanding_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::ZERO),
        (-100_000i64..0i64).prop_map(|n| Decimal::new(n, 2)),
        (1i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2)),
    ]
}

/// Coverage periods between 1 and 730 days long
pub fn coverage_period_strategy() -> impl Strategy<Value = CoveragePeriod> {
    (0i64..3650, 0i64..730).prop_map(|(offset, length)| {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let start = base + Duration::days(offset);
        CoveragePeriod::new(start, start + Duration::days(length)).unwrap()
    })
}

/// A coverage period together with a date up to 30 days either side of it
pub fn period_and_date_strategy() -> impl Strategy<Value = (CoveragePeriod, NaiveDate)> {
    coverage_period_strategy().prop_flat_map(|period| {
        let span = (period.end - period.start).num_days();
        (-30i64..=span + 30).prop_map(move |offset| (period, period.start + Duration::days(offset)))
    })
}

/// Indian-style registration numbers
pub fn registration_no_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2}[0-9]{2}[A-Z]{1,2}[0-9]{4}"
}

/// Reasons with at least one non-whitespace character
pub fn reason_strategy() -> impl Strategy<Value = String> {
    "[ ]{0,3}[A-Za-z][A-Za-z ,.]{0,40}"
}

/// Strings made only of whitespace
pub fn blank_strategy() -> impl Strategy<Value = String> {
    "[ \t\n]{0,8}"
}

/// Registry fuel text mixing known keywords with noise
pub fn fuel_text_strategy() -> impl Strategy<Value = String> {
    let keyword = prop::sample::select(vec![
        "PETROL", "petrol", "DIESEL", "Diesel", "CNG", "cng", "ELECTRIC", "Electric(BOV)",
        "HYBRID", "hybrid", "LPG", "lpg", "HYDROGEN", "",
    ]);
    (keyword.clone(), "[/ ]{0,2}", keyword).prop_map(|(a, sep, b)| format!("{}{}{}", a, sep, b))
}
