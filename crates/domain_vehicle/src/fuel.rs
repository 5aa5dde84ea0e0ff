//! Fuel type normalisation
//!
//! Registries return fuel as free text ("PETROL/CNG", "Diesel (BS-VI)").
//! The text is upper-cased and checked for each keyword in a fixed priority
//! order; the first keyword found decides the fuel type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fuel type of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Petrol,
    Diesel,
    #[serde(rename = "CNG")]
    Cng,
    Electric,
    Hybrid,
    #[serde(rename = "LPG")]
    Lpg,
}

impl FuelType {
    /// Keyword match order
    pub const PRIORITY: [FuelType; 6] = [
        FuelType::Petrol,
        FuelType::Diesel,
        FuelType::Cng,
        FuelType::Electric,
        FuelType::Hybrid,
        FuelType::Lpg,
    ];

    /// Upper-case keyword searched for in registry text
    pub fn keyword(&self) -> &'static str {
        match self {
            FuelType::Petrol => "PETROL",
            FuelType::Diesel => "DIESEL",
            FuelType::Cng => "CNG",
            FuelType::Electric => "ELECTRIC",
            FuelType::Hybrid => "HYBRID",
            FuelType::Lpg => "LPG",
        }
    }

    /// Stored label
    pub fn label(&self) -> &'static str {
        match self {
            FuelType::Petrol => "Petrol",
            FuelType::Diesel => "Diesel",
            FuelType::Cng => "CNG",
            FuelType::Electric => "Electric",
            FuelType::Hybrid => "Hybrid",
            FuelType::Lpg => "LPG",
        }
    }

    /// Maps registry free text to a fuel type
    ///
    /// Returns `None` when no keyword occurs in the text.
    ///
    /// # Example
    ///
    /// ```rust
    /// use domain_vehicle::FuelType;
    ///
    /// assert_eq!(FuelType::from_registry_text("PETROL/CNG HYBRID"), Some(FuelType::Petrol));
    /// assert_eq!(FuelType::from_registry_text("cng"), Some(FuelType::Cng));
    /// assert_eq!(FuelType::from_registry_text("hydrogen"), None);
    /// ```
    pub fn from_registry_text(text: &str) -> Option<FuelType> {
        let upper = text.to_uppercase();
        Self::PRIORITY
            .iter()
            .copied()
            .find(|fuel| upper.contains(fuel.keyword()))
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_keyword_in_priority_order_wins() {
        assert_eq!(FuelType::from_registry_text("PETROL/CNG HYBRID"), Some(FuelType::Petrol));
        assert_eq!(FuelType::from_registry_text("CNG/PETROL"), Some(FuelType::Petrol));
        assert_eq!(FuelType::from_registry_text("ELECTRIC/DIESEL"), Some(FuelType::Diesel));
        assert_eq!(FuelType::from_registry_text("HYBRID LPG"), Some(FuelType::Hybrid));
        assert_eq!(FuelType::from_registry_text("Electric(BOV) Hybrid"), Some(FuelType::Electric));
    }

    #[test]
    fn test_matching_ignores_case() {
        assert_eq!(FuelType::from_registry_text("diesel"), Some(FuelType::Diesel));
        assert_eq!(FuelType::from_registry_text("Lpg kit"), Some(FuelType::Lpg));
    }

    #[test]
    fn test_unmatched_text() {
        assert_eq!(FuelType::from_registry_text(""), None);
        assert_eq!(FuelType::from_registry_text("HYDROGEN"), None);
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(serde_json::to_value(FuelType::Cng).unwrap(), "CNG");
        assert_eq!(serde_json::to_value(FuelType::Petrol).unwrap(), "Petrol");
        let parsed: FuelType = serde_json::from_value(serde_json::json!("LPG")).unwrap();
        assert_eq!(parsed, FuelType::Lpg);
    }
}
