//! Vehicle record
//!
//! The typed view of a `Vehicle` document. Once the registration certificate
//! (RC) has been verified against the registry, the identifying fields are
//! frozen: only the administrative override role may change them.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use core_kernel::FieldMap;

use crate::error::VehicleError;
use crate::fuel::FuelType;

/// Role allowed to edit verified fields
pub const ADMIN_OVERRIDE_ROLE: &str = "System Manager";

/// Fields that become read-only after a successful verification
pub const LOCKED_FIELDS: [&str; 9] = [
    "make",
    "model",
    "variant",
    "chassis_no",
    "engine_no",
    "manufacturing_year",
    "fuel_type",
    "vehicle_type",
    "registration_no",
];

/// Fields written only by the verification flow
pub const VERIFICATION_FIELDS: [&str; 3] = ["rc_verified", "rc_api_reference_id", "rc_raw_response"];

/// RC status the registry reports for a roadworthy registration
pub const RC_STATUS_ACTIVE: &str = "ACTIVE";

/// A vehicle as stored in the document store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub registration_no: Option<String>,
    pub chassis_no: Option<String>,
    pub engine_no: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    /// Stored label or raw registry text; text naming no known fuel reads as `None`
    #[serde(default, deserialize_with = "deserialize_fuel")]
    pub fuel_type: Option<FuelType>,
    pub vehicle_class: Option<String>,
    pub vehicle_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_year")]
    pub manufacturing_year: Option<i32>,
    /// Upper-cased registry status, e.g. `ACTIVE`
    pub rc_status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub rc_expiry_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub rc_verified: bool,
    pub rc_api_reference_id: Option<String>,
    /// Registry payload exactly as received
    pub rc_raw_response: Option<String>,
}

/// Accepts `true`/`false`, `0`/`1` or null
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        None => false,
    })
}

/// Reads a fuel label, falling back to keyword matching on registry text
fn deserialize_fuel<'de, D>(deserializer: D) -> Result<Option<FuelType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => serde_json::from_value(Value::String(text.clone()))
            .ok()
            .or_else(|| FuelType::from_registry_text(&text)),
        _ => None,
    })
}

/// Accepts a number or numeric text; anything else is treated as unset
fn deserialize_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Accepts `YYYY-MM-DD` or `DD-MM-YYYY`; blank or unparseable text is unset
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => {
            let text = text.trim();
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(text, "%d-%m-%Y"))
                .ok()
        }
        _ => None,
    })
}

/// Returns true if the principal holds the override role
pub fn has_override_role(roles: &[String]) -> bool {
    roles.iter().any(|r| r == ADMIN_OVERRIDE_ROLE)
}

impl Vehicle {
    /// Trimmed registration number, if one is set
    pub fn registration(&self) -> Option<&str> {
        self.registration_no
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Returns true if the field is currently frozen for ordinary users
    pub fn is_locked(&self, field: &str) -> bool {
        VERIFICATION_FIELDS.contains(&field) || (self.rc_verified && LOCKED_FIELDS.contains(&field))
    }

    /// Checks that an edit only touches fields the principal may change
    ///
    /// `current` is the stored field map the vehicle was decoded from. An
    /// update that writes a locked field with its present value is not an
    /// edit and passes.
    ///
    /// # Errors
    ///
    /// Returns `VehicleError::FieldLocked` naming the first offending field.
    pub fn ensure_editable(
        &self,
        current: &FieldMap,
        updates: &FieldMap,
        roles: &[String],
    ) -> Result<(), VehicleError> {
        if has_override_role(roles) {
            return Ok(());
        }

        for (field, value) in updates {
            let unchanged = current.get(field).unwrap_or(&Value::Null) == value;
            if !unchanged && self.is_locked(field) {
                return Err(VehicleError::locked(field.clone()));
            }
        }
        Ok(())
    }

    /// Checks the vehicle can back a new proposal on `today`
    ///
    /// The RC must be verified, report status ACTIVE and not be past its
    /// expiry date.
    pub fn ensure_insurable(&self, today: NaiveDate) -> Result<(), VehicleError> {
        if !self.rc_verified {
            return Err(VehicleError::validation(
                "Vehicle RC must be verified before proceeding with the proposal",
            ));
        }

        if self.rc_status.as_deref() != Some(RC_STATUS_ACTIVE) {
            return Err(VehicleError::validation(format!(
                "Vehicle RC status must be ACTIVE. Current status: {}",
                self.rc_status.as_deref().unwrap_or("not set")
            )));
        }

        if let Some(expiry) = self.rc_expiry_date {
            if expiry < today {
                return Err(VehicleError::validation(format!(
                    "Vehicle RC has expired. Expiry Date: {}",
                    expiry
                )));
            }
        }

        Ok(())
    }
}
