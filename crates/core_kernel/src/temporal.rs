//! Date-range handling
//!
//! Pricing rules can be limited to a calendar window, e.g. a spring promotion
//! running from March 1 through May 31. Both ends are inclusive and either may
//! be left open.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange {
        start: String,
        end: String,
    },
}

/// An inclusive calendar date range; `None` on either side means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day the range covers
    pub start: Option<NaiveDate>,
    /// Last day the range covers
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a new date range, rejecting inverted bounds
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, TemporalError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(TemporalError::InvalidRange {
                    start: s.to_string(),
                    end: e.to_string(),
                });
            }
        }
        Ok(Self { start, end })
    }

    /// Creates a range with both ends fixed
    pub fn bounded(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        Self::new(Some(start), Some(end))
    }

    /// Creates a range open towards the future
    pub fn starting(start: NaiveDate) -> Self {
        Self { start: Some(start), end: None }
    }

    /// Creates a range open towards the past
    pub fn until(end: NaiveDate) -> Self {
        Self { start: None, end: Some(end) }
    }

    /// Returns true if the date falls within the range, both ends inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// Returns true if neither end is set
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_range_is_inclusive_on_both_ends() {
        let range = DateRange::bounded(d(2024, 3, 1), d(2024, 5, 31)).unwrap();
        assert!(range.contains(d(2024, 3, 1)));
        assert!(range.contains(d(2024, 5, 31)));
        assert!(!range.contains(d(2024, 2, 29)));
        assert!(!range.contains(d(2024, 6, 1)));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = DateRange::bounded(d(2024, 6, 1), d(2024, 5, 1));
        assert!(matches!(result, Err(TemporalError::InvalidRange { .. })));
    }

    #[test]
    fn test_open_ended_ranges() {
        assert!(DateRange::starting(d(2024, 1, 1)).contains(d(2099, 1, 1)));
        assert!(DateRange::until(d(2024, 1, 1)).contains(d(1999, 1, 1)));
        assert!(!DateRange::until(d(2024, 1, 1)).contains(d(2024, 1, 2)));
    }
}
