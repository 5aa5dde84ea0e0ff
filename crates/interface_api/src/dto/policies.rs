//! Policy DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use domain_workflow::PolicyPayment;

#[derive(Debug, Deserialize, Validate)]
pub struct PolicyPaymentRequest {
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Mode of Payment is required"))]
    pub mode_of_payment: String,
    #[validate(length(min = 1, message = "Paid To Account is required"))]
    pub paid_to: String,
    #[validate(length(max = 140))]
    pub reference_no: Option<String>,
    pub reference_date: Option<NaiveDate>,
}

impl From<PolicyPaymentRequest> for PolicyPayment {
    fn from(request: PolicyPaymentRequest) -> Self {
        PolicyPayment {
            amount: request.amount,
            mode_of_payment: request.mode_of_payment,
            paid_to: request.paid_to,
            reference_no: request.reference_no.filter(|r| !r.trim().is_empty()),
            reference_date: request.reference_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClaimRequest {
    pub date_of_loss: NaiveDate,
    pub claim_amount: Option<Decimal>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}
