//! Premium calculation
//!
//! Own damage (OD) is rated on the vehicle's IDV or charged flat, held
//! between the plan's minimum and maximum, then reduced by the no-claim
//! bonus. Third party cover and the chosen add-ons are added on top and GST
//! is charged on the net total. Every component is rounded to paise before
//! it is summed, so the reported totals always add up.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{DocType, Document};

use crate::error::WorkflowError;

fn default_gst_rate() -> Decimal {
    Decimal::from(18)
}

fn money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

fn percent_of(base: Decimal, rate: Decimal) -> Decimal {
    base * rate / Decimal::ONE_HUNDRED
}

/// How the OD premium is rated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateType {
    /// Percentage of IDV
    #[default]
    Percentage,
    Flat,
}

/// How an add-on is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddonPricing {
    Flat,
    #[serde(rename = "Percentage of IDV")]
    PercentageOfIdv,
}

/// An add-on a plan offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAddon {
    pub addon: String,
    pub pricing_type: AddonPricing,
    pub pricing_value: Decimal,
}

impl PlanAddon {
    fn premium(&self, idv: Decimal) -> Decimal {
        match self.pricing_type {
            AddonPricing::Flat => self.pricing_value,
            AddonPricing::PercentageOfIdv => percent_of(idv, self.pricing_value),
        }
    }
}

/// Rating terms of an insurance plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsurancePlan {
    #[serde(default)]
    pub od_rate_type: RateType,
    pub od_rate_value: Decimal,
    #[serde(default)]
    pub min_od_premium: Option<Decimal>,
    /// Zero or absent means uncapped
    #[serde(default)]
    pub max_od_premium: Option<Decimal>,
    #[serde(default)]
    pub tp_premium_value: Decimal,
    /// Zero or absent falls back to 18%
    #[serde(default)]
    pub gst_rate: Option<Decimal>,
    /// Days after the start of cover during which no claim is accepted
    #[serde(default)]
    pub waiting_period_days: u32,
    #[serde(default)]
    pub plan_addons: Vec<PlanAddon>,
}

/// Premium charged for one add-on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddonPremium {
    pub addon: String,
    pub premium_amount: Decimal,
}

/// Breakdown of a quoted premium
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PremiumQuote {
    /// OD premium before the no-claim bonus
    pub od_premium_base: Decimal,
    pub ncb_discount: Decimal,
    /// OD premium after the no-claim bonus
    pub od_premium: Decimal,
    pub tp_premium: Decimal,
    pub addon_premium: Decimal,
    pub addon_details: Vec<AddonPremium>,
    pub total_net_premium: Decimal,
    pub gst_rate: Decimal,
    pub total_gst: Decimal,
    pub grand_total_premium: Decimal,
}

impl InsurancePlan {
    /// Decodes a stored plan
    pub fn from_document(doc: &Document) -> Result<Self, WorkflowError> {
        if doc.doctype != DocType::Plan {
            return Err(WorkflowError::InvalidDocument(format!(
                "expected {}, got {} {}",
                DocType::Plan,
                doc.doctype,
                doc.name
            )));
        }
        Ok(doc.decode()?)
    }

    fn od_premium(&self, idv: Decimal) -> Decimal {
        let rated = match self.od_rate_type {
            RateType::Percentage => percent_of(idv, self.od_rate_value),
            RateType::Flat => self.od_rate_value,
        };
        let floored = match self.min_od_premium {
            Some(min) if rated < min => min,
            _ => rated,
        };
        match self.max_od_premium {
            Some(max) if max > Decimal::ZERO && floored > max => max,
            _ => floored,
        }
    }

    fn effective_gst_rate(&self) -> Decimal {
        self.gst_rate
            .filter(|rate| *rate > Decimal::ZERO)
            .unwrap_or_else(default_gst_rate)
    }

    /// Quotes the premium for a vehicle of value `idv`
    ///
    /// Add-ons the plan does not offer are ignored and each offered add-on is
    /// charged once however often it is requested.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Validation` for a non-positive IDV or a
    /// no-claim bonus outside 0 to 100 percent
    pub fn quote(
        &self,
        idv: Decimal,
        addons: &[String],
        ncb_percent: Decimal,
    ) -> Result<PremiumQuote, WorkflowError> {
        if idv <= Decimal::ZERO {
            return Err(WorkflowError::validation("Vehicle IDV must be a positive value"));
        }
        if ncb_percent < Decimal::ZERO || ncb_percent > Decimal::ONE_HUNDRED {
            return Err(WorkflowError::validation(
                "No Claim Bonus must be between 0 and 100 percent",
            ));
        }

        let od_premium_base = money(self.od_premium(idv));
        let ncb_discount = money(percent_of(od_premium_base, ncb_percent));
        let od_premium = (od_premium_base - ncb_discount).max(Decimal::ZERO);
        let tp_premium = money(self.tp_premium_value);

        let mut seen = HashSet::new();
        let addon_details: Vec<AddonPremium> = addons
            .iter()
            .map(|a| a.trim())
            .filter(|a| seen.insert(*a))
            .filter_map(|requested| self.plan_addons.iter().find(|row| row.addon == requested))
            .map(|row| AddonPremium {
                addon: row.addon.clone(),
                premium_amount: money(row.premium(idv)),
            })
            .collect();
        let addon_premium = addon_details.iter().map(|a| a.premium_amount).sum::<Decimal>();

        let total_net_premium = od_premium + tp_premium + addon_premium;
        let gst_rate = self.effective_gst_rate();
        let total_gst = money(percent_of(total_net_premium, gst_rate));

        Ok(PremiumQuote {
            od_premium_base,
            ncb_discount,
            od_premium,
            tp_premium,
            addon_premium,
            addon_details,
            total_net_premium,
            gst_rate,
            total_gst,
            grand_total_premium: total_net_premium + total_gst,
        })
    }
}
