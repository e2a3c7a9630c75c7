//! Per-record margin under each branch of the decision
//!
//! Each weekly record contributes revenue minus incentive cost to whichever
//! branch its household ends up in. The VIP branch scales every term, costs
//! included, by the week's seasonal multiplier; the non-VIP branch is never
//! scaled.

use super::super::features::{HouseholdFeatures, WeightedRecord};
use super::super::params::SelectionParams;

/// Margin a record (or household) yields as VIP and as non-VIP
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BranchMargin {
    pub vip: f64,
    pub non_vip: f64,
}

impl std::ops::Add for BranchMargin {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            vip: self.vip + other.vip,
            non_vip: self.non_vip + other.non_vip,
        }
    }
}

impl std::iter::Sum for BranchMargin {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, m| acc + m)
    }
}

impl BranchMargin {
    /// Gain from moving the household into the VIP branch
    pub fn lift(&self) -> f64 {
        self.vip - self.non_vip
    }
}

/// Margin contribution of a single weekly record
pub fn record_margin(weighted: &WeightedRecord, params: &SelectionParams) -> BranchMargin {
    let r = &weighted.record;
    let m = weighted.multiplier;
    let rates = &params.margin_rates;
    let costs = &params.incentive_costs;

    let revenue = rates.general_merchandise * (r.non_ob_spend + r.ob_spend)
        + rates.fuel * r.fuel_gallons
        + rates.grocery * r.gc_spend
        + rates.convenience * r.cs_spend;

    let vip_incentive = (costs.vip.non_ob * r.non_ob_spend
        + costs.vip.ob * r.ob_spend
        + costs.vip.fuel * r.fuel_gallons
        + costs.vip.grocery * r.gc_spend
        + costs.vip.convenience * r.cs_spend)
        / costs.divisor;

    let baseline_incentive = (costs.baseline.non_ob * r.non_ob_spend
        + costs.baseline.ob * r.ob_spend
        + costs.baseline.fuel * r.fuel_gallons
        + costs.baseline.grocery * r.gc_spend
        + costs.baseline.convenience * r.cs_spend)
        / costs.divisor;

    let discount = costs.ob_discount_rate * r.ob_spend;

    BranchMargin {
        vip: m * (revenue - discount - vip_incentive),
        non_vip: revenue - baseline_incentive,
    }
}

/// Sum of record margins over all of a household's weeks
pub fn household_margin(household: &HouseholdFeatures, params: &SelectionParams) -> BranchMargin {
    household
        .records
        .iter()
        .map(|r| record_margin(r, params))
        .sum()
}
