//! Plan DTOs

use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct PremiumQuoteRequest {
    pub idv: Decimal,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub addons: Vec<String>,
    #[serde(default)]
    pub ncb_percent: Decimal,
}
