//! RC verification outcomes and field mapping
//!
//! A registry lookup ends in exactly one of three outcomes. Callers branch on
//! the variant, since each one asks the user for something different:
//!
//! ```text
//! SUCCESS  -> present fields overwrite the vehicle, rc_verified = true
//! ERROR    -> rc_verified = false, raw payload kept for audit
//! TIMEOUT  -> nothing is written
//! ```

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use core_kernel::FieldMap;

use crate::fuel::FuelType;

/// Registry `status` values that mean the lookup succeeded
pub const SUCCESS_STATUSES: [&str; 2] = ["SUCCESS", "VALID"];

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("year pattern is valid"));

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d-%b-%Y", "%Y/%m/%d"];

/// Vehicle fields returned by a successful registry lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RcDetails {
    #[serde(default, rename = "vehicle_chassis_number")]
    pub chassis_no: Option<String>,
    #[serde(default, rename = "vehicle_engine_number")]
    pub engine_no: Option<String>,
    #[serde(default, rename = "vehicle_manufacturer_name")]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Free text, normalised through [`FuelType::from_registry_text`]
    #[serde(default, rename = "vehicle_fuel_type")]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub vehicle_class: Option<String>,
    #[serde(default, rename = "vehicle_manufacturing_month_year")]
    pub manufacturing_date: Option<String>,
    #[serde(default)]
    pub rc_status: Option<String>,
    #[serde(default, rename = "vehicle_registration_date_expiry")]
    pub rc_expiry: Option<String>,
    #[serde(default, deserialize_with = "deserialize_reference")]
    pub reference_id: Option<String>,
}

fn deserialize_reference<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "reference_id must be a string or number, got {}",
            other
        ))),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn set_text(patch: &mut FieldMap, field: &str, value: &Option<String>) {
    if let Some(text) = non_empty(value) {
        patch.insert(field.to_string(), Value::from(text));
    }
}

/// Extracts the first standalone 4-digit year from registry text
///
/// ```rust
/// use domain_vehicle::verification::extract_year;
///
/// assert_eq!(extract_year("03/2019"), Some(2019));
/// assert_eq!(extract_year("MAR-2021"), Some(2021));
/// assert_eq!(extract_year("unknown"), None);
/// ```
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parses a date in any of the formats registries are known to send
pub fn parse_registry_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            // ISO timestamps: keep the date part
            text.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

impl RcDetails {
    /// Builds the field updates for a successful lookup
    ///
    /// Only fields the registry actually returned are written. A fuel text,
    /// manufacturing date or expiry date that cannot be interpreted leaves the
    /// corresponding field untouched without failing the verification.
    pub fn to_patch(&self, raw_response: &str) -> FieldMap {
        let mut patch = FieldMap::new();

        set_text(&mut patch, "chassis_no", &self.chassis_no);
        set_text(&mut patch, "engine_no", &self.engine_no);
        set_text(&mut patch, "make", &self.make);
        set_text(&mut patch, "model", &self.model);
        set_text(&mut patch, "vehicle_class", &self.vehicle_class);

        if let Some(text) = non_empty(&self.fuel_type) {
            match FuelType::from_registry_text(text) {
                Some(fuel) => {
                    patch.insert("fuel_type".into(), Value::from(fuel.label()));
                }
                None => debug!(fuel_text = text, "Unrecognised fuel type, field left unchanged"),
            }
        }

        if let Some(text) = non_empty(&self.manufacturing_date) {
            match extract_year(text) {
                Some(year) => {
                    patch.insert("manufacturing_year".into(), Value::from(year));
                }
                None => warn!(value = text, "Could not extract manufacturing year"),
            }
        }

        if let Some(status) = non_empty(&self.rc_status) {
            patch.insert("rc_status".into(), Value::from(status.to_uppercase()));
        }

        if let Some(text) = non_empty(&self.rc_expiry) {
            match parse_registry_date(text) {
                Some(date) => {
                    patch.insert("rc_expiry_date".into(), Value::from(date.to_string()));
                }
                None => warn!(value = text, "Could not parse RC expiry date"),
            }
        }

        patch.insert("rc_verified".into(), Value::Bool(true));
        patch.insert(
            "rc_api_reference_id".into(),
            self.reference_id.clone().map(Value::from).unwrap_or(Value::Null),
        );
        patch.insert("rc_raw_response".into(), Value::from(raw_response));
        patch
    }
}

/// What the user should be told after a verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guidance {
    Verified,
    /// Check the registration number or escalate to operations
    FixInputOrEscalate,
    /// Try again later or enter the details manually
    RetryOrEnterManually,
}

impl Guidance {
    pub fn message(&self) -> &'static str {
        match self {
            Guidance::Verified => "Vehicle RC verified successfully.",
            Guidance::FixInputOrEscalate => {
                "Verification failed. Check the registration number or escalate to operations."
            }
            Guidance::RetryOrEnterManually => {
                "API request timed out. Please try again or verify manually if allowed."
            }
        }
    }
}

/// Result of one registry lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationOutcome {
    Success {
        details: RcDetails,
        raw_response: String,
    },
    Error {
        message: String,
        raw_response: String,
    },
    Timeout,
}

impl VerificationOutcome {
    /// Interprets a registry HTTP response
    ///
    /// Any non-2xx status, unreadable body or non-success `status` field is
    /// an `Error` carrying the body verbatim. Details may sit at the top
    /// level of the body or under `data`.
    pub fn from_registry_response(http_status: u16, body: &str) -> Self {
        let raw_response = body.to_string();
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string);

        if !(200..300).contains(&http_status) {
            return VerificationOutcome::Error {
                message: message.unwrap_or_else(|| format!("Registry returned HTTP {}", http_status)),
                raw_response,
            };
        }

        let Some(body_json) = parsed else {
            return VerificationOutcome::Error {
                message: "Registry response is not valid JSON".to_string(),
                raw_response,
            };
        };

        let status = body_json
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_uppercase);

        match status.as_deref() {
            Some(s) if SUCCESS_STATUSES.contains(&s) => {
                let payload = body_json
                    .get("data")
                    .filter(|d| d.is_object())
                    .unwrap_or(&body_json);

                match RcDetails::deserialize(payload) {
                    Ok(mut details) => {
                        if details.reference_id.is_none() {
                            details.reference_id = body_json
                                .get("reference_id")
                                .and_then(|r| match r {
                                    Value::String(s) => Some(s.clone()),
                                    Value::Number(n) => Some(n.to_string()),
                                    _ => None,
                                });
                        }
                        VerificationOutcome::Success { details, raw_response }
                    }
                    Err(e) => VerificationOutcome::Error {
                        message: format!("Registry response could not be read: {}", e),
                        raw_response,
                    },
                }
            }
            Some(other) => VerificationOutcome::Error {
                message: message.unwrap_or_else(|| format!("Registry reported status {}", other)),
                raw_response,
            },
            None => VerificationOutcome::Error {
                message: message.unwrap_or_else(|| "Registry response carries no status".to_string()),
                raw_response,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, VerificationOutcome::Success { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, VerificationOutcome::Timeout)
    }

    pub fn guidance(&self) -> Guidance {
        match self {
            VerificationOutcome::Success { .. } => Guidance::Verified,
            VerificationOutcome::Error { .. } => Guidance::FixInputOrEscalate,
            VerificationOutcome::Timeout => Guidance::RetryOrEnterManually,
        }
    }

    /// Field updates to persist, or `None` when nothing may be written
    pub fn patch(&self) -> Option<FieldMap> {
        match self {
            VerificationOutcome::Success { details, raw_response } => Some(details.to_patch(raw_response)),
            VerificationOutcome::Error { raw_response, .. } => {
                let mut patch = FieldMap::new();
                patch.insert("rc_verified".into(), Value::Bool(false));
                patch.insert("rc_raw_response".into(), Value::from(raw_response.as_str()));
                Some(patch)
            }
            VerificationOutcome::Timeout => None,
        }
    }
}
