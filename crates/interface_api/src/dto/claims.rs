//! Claim DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_workflow::BulkAssignmentReport;

/// Bulk move of selected claims to survey
#[derive(Debug, Deserialize, Validate)]
pub struct SurveyAssignmentRequest {
    #[validate(length(min = 1, message = "Please select at least one claim"))]
    pub claims: Vec<String>,
    pub surveyor: String,
    pub survey_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SurveyAssignmentResponse {
    pub message: String,
    pub assigned: usize,
    #[serde(flatten)]
    pub report: BulkAssignmentReport,
}

impl From<BulkAssignmentReport> for SurveyAssignmentResponse {
    fn from(report: BulkAssignmentReport) -> Self {
        Self {
            message: report.message(),
            assigned: report.success_count(),
            report,
        }
    }
}

/// Moves a claim to the next lifecycle status
#[derive(Debug, Deserialize)]
pub struct AdvanceClaimRequest {
    pub status: String,
    pub approved_amount: Option<Decimal>,
}
