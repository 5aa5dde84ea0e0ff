//! Strongly-typed document names
//!
//! Documents are addressed by human-readable names such as
//! `PROP-2026-0190f2c1...`. Newtype wrappers keep a proposal name from being
//! passed where a claim name is expected.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! define_name {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a new time-ordered name for the current year
            pub fn generate() -> Self {
                let suffix = Uuid::now_v7().simple().to_string();
                Self(format!("{}-{}-{}", $prefix, Utc::now().year(), &suffix[..12]))
            }

            /// Returns the name prefix
            pub fn prefix() -> &'static str {
                $prefix
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(CoreError::validation(concat!(
                        stringify!($name),
                        " must not be empty"
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> String {
                name.0
            }
        }
    };
}

define_name!(ProposalName, "PROP");
define_name!(PolicyName, "POL");
define_name!(ClaimName, "CLM");
define_name!(VehicleName, "VEH");
define_name!(PaymentEntryName, "PAY");
define_name!(JournalEntryName, "JE");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_name_has_prefix_and_year() {
        let name = ClaimName::generate();
        let year = Utc::now().year().to_string();
        assert!(name.as_str().starts_with("CLM-"));
        assert!(name.as_str().contains(&year));
    }

    #[test]
    fn test_generated_names_are_unique() {
        assert_ne!(PolicyName::generate(), PolicyName::generate());
    }

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        let parsed: ProposalName = "  PROP-2026-00001 ".parse().unwrap();
        assert_eq!(parsed.as_str(), "PROP-2026-00001");
        assert!("   ".parse::<ProposalName>().is_err());
    }
}
