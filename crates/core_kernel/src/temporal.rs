//! Coverage period handling
//!
//! A policy covers losses on whole calendar days. Both ends of the period
//! are part of the cover, so a loss on the start date or on the end date is
//! inside the period.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must not be after end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },

    #[error("Missing period boundary: {0}")]
    MissingBoundary(String),
}

/// The dates a policy provides cover for
///
/// Both `start` and `end` are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveragePeriod {
    /// First covered day
    pub start: NaiveDate,
    /// Last covered day
    pub end: NaiveDate,
}

impl CoveragePeriod {
    /// Creates a new coverage period
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Builds a period from optional stored boundaries
    pub fn from_bounds(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, TemporalError> {
        let start = start.ok_or_else(|| TemporalError::MissingBoundary("start".to_string()))?;
        let end = end.ok_or_else(|| TemporalError::MissingBoundary("end".to_string()))?;
        Self::new(start, end)
    }

    /// Returns true if the date falls on or between the boundaries
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of whole days elapsed between the period start and `date`
    pub fn days_since_start(&self, date: NaiveDate) -> i64 {
        (date - self.start).num_days()
    }

    /// Returns true if the period ended before `today`
    pub fn has_ended(&self, today: NaiveDate) -> bool {
        self.end < today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_contains_is_boundary_inclusive() {
        let period = CoveragePeriod::new(date(2026, 1, 1), date(2026, 12, 31)).unwrap();
        assert!(period.contains(date(2026, 1, 1)));
        assert!(period.contains(date(2026, 12, 31)));
        assert!(!period.contains(date(2025, 12, 31)));
        assert!(!period.contains(date(2027, 1, 1)));
    }

    #[test]
    fn test_single_day_period() {
        let period = CoveragePeriod::new(date(2026, 3, 1), date(2026, 3, 1)).unwrap();
        assert!(period.contains(date(2026, 3, 1)));
    }

    #[test]
    fn test_inverted_period_rejected() {
        let result = CoveragePeriod::new(date(2026, 3, 2), date(2026, 3, 1));
        assert!(matches!(result, Err(TemporalError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_missing_bounds() {
        let result = CoveragePeriod::from_bounds(Some(date(2026, 1, 1)), None);
        assert_eq!(result, Err(TemporalError::MissingBoundary("end".to_string())));
    }
}
