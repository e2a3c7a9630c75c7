//! Week-dependent multiplier for VIP spend
//!
//! VIP promotions run in two weeks of the campaign window. Spend in those weeks
//! is assumed to be pulled forward by 20%, and the weeks either side of each
//! promotion see a 10% dip. Non-VIP spend is never scaled.

use serde::{Deserialize, Serialize};

use super::error::{SelectionError, SelectionResult};

/// Mapping from week identifier to VIP spend multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalCalendar {
    /// Promotion weeks
    pub promotion_weeks: Vec<i64>,
    /// Multiplier applied in promotion weeks
    pub promotion_rate: f64,
    /// Weeks immediately before and after a promotion
    pub adjacent_weeks: Vec<i64>,
    /// Multiplier applied in adjacent weeks
    pub adjacent_rate: f64,
    /// Multiplier for every other week
    pub baseline_rate: f64,
}

impl Default for SeasonalCalendar {
    fn default() -> Self {
        Self {
            promotion_weeks: vec![3, 7],
            promotion_rate: 1.2,
            adjacent_weeks: vec![2, 4, 6, 8],
            adjacent_rate: 0.9,
            baseline_rate: 1.0,
        }
    }
}

impl SeasonalCalendar {
    /// Multiplier for the given week
    pub fn multiplier(&self, week: i64) -> f64 {
        if self.promotion_weeks.contains(&week) {
            self.promotion_rate
        } else if self.adjacent_weeks.contains(&week) {
            self.adjacent_rate
        } else {
            self.baseline_rate
        }
    }

    /// Check that rates are usable and that no week is listed twice
    pub fn validate(&self) -> SelectionResult<()> {
        for (name, rate) in [
            ("calendar.promotion_rate", self.promotion_rate),
            ("calendar.adjacent_rate", self.adjacent_rate),
            ("calendar.baseline_rate", self.baseline_rate),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(SelectionError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("must be a finite non-negative number, got {}", rate),
                });
            }
        }

        if let Some(week) = self
            .promotion_weeks
            .iter()
            .find(|w| self.adjacent_weeks.contains(w))
        {
            return Err(SelectionError::InvalidParameter {
                name: "calendar.adjacent_weeks".to_string(),
                reason: format!("week {} is also a promotion week", week),
            });
        }

        Ok(())
    }
}
