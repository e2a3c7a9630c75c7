//! Selection model construction
//!
//! The model is solver-agnostic: one pair of binary decisions per household,
//! the margin each branch would yield, and an explicit constraint list. A
//! backend turns it into a concrete MIP.

use std::collections::HashMap;

use super::super::error::SelectionResult;
use super::super::features::PreparedFeatures;
use super::super::params::SelectionParams;
use super::objective::{household_margin, BranchMargin};

/// The two decision slots owned by one household.
///
/// Holds solver variables while a model is being built and the solved values
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPair<T> {
    pub is_vip: T,
    pub is_non_vip: T,
}

/// Objective coefficients and eligibility for one household
#[derive(Debug, Clone)]
pub struct HouseholdTerm {
    pub household: String,
    pub margin: BranchMargin,
    pub eligible: bool,
}

/// A linear constraint of the selection model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelConstraint {
    /// Sum of `is_vip` over all households is at most `limit`
    HeadcountCap { limit: usize },
    /// `is_vip + is_non_vip == 1` for the household at this index
    Exclusive { household: usize },
    /// `is_vip == 0` for the household at this index
    ForcedNonVip { household: usize },
}

/// Margin-maximizing VIP selection problem
#[derive(Debug, Clone)]
pub struct SelectionModel {
    households: Vec<HouseholdTerm>,
    index: HashMap<String, usize>,
    vip_cap: usize,
}

impl SelectionModel {
    pub fn households(&self) -> &[HouseholdTerm] {
        &self.households
    }

    /// Look up a household's term by id
    pub fn household(&self, id: &str) -> Option<&HouseholdTerm> {
        self.index.get(id).map(|&i| &self.households[i])
    }

    pub fn vip_cap(&self) -> usize {
        self.vip_cap
    }

    pub fn eligible_count(&self) -> usize {
        self.households.iter().filter(|h| h.eligible).count()
    }

    /// Every constraint of the model: the headcount cap, then one exclusivity
    /// row per household, then one forcing row per ineligible household.
    pub fn constraints(&self) -> Vec<ModelConstraint> {
        let mut constraints = Vec::with_capacity(1 + 2 * self.households.len());
        constraints.push(ModelConstraint::HeadcountCap {
            limit: self.vip_cap,
        });
        constraints.extend(
            (0..self.households.len()).map(|household| ModelConstraint::Exclusive { household }),
        );
        constraints.extend(
            self.households
                .iter()
                .enumerate()
                .filter(|(_, h)| !h.eligible)
                .map(|(household, _)| ModelConstraint::ForcedNonVip { household }),
        );
        constraints
    }

    /// Objective value of an assignment given in household order
    pub fn objective_value(&self, assignment: &[DecisionPair<f64>]) -> f64 {
        self.households
            .iter()
            .zip(assignment)
            .map(|(term, pair)| term.margin.vip * pair.is_vip + term.margin.non_vip * pair.is_non_vip)
            .sum()
    }

    /// Objective value with every household left out of the VIP program
    pub fn baseline_value(&self) -> f64 {
        self.households.iter().map(|term| term.margin.non_vip).sum()
    }
}

/// Build the selection model from prepared features
pub fn build_model(
    features: &PreparedFeatures,
    params: &SelectionParams,
) -> SelectionResult<SelectionModel> {
    params.validate()?;

    let mut index = HashMap::with_capacity(features.households.len());
    let households: Vec<HouseholdTerm> = features
        .households
        .iter()
        .enumerate()
        .map(|(i, h)| {
            index.insert(h.household.clone(), i);
            HouseholdTerm {
                household: h.household.clone(),
                margin: household_margin(h, params),
                eligible: h.is_eligible(params.eligibility_threshold),
            }
        })
        .collect();

    let model = SelectionModel {
        households,
        index,
        vip_cap: params.vip_cap,
    };

    log::debug!(
        "built model: {} households, {} eligible, cap {}",
        model.households.len(),
        model.eligible_count(),
        model.vip_cap
    );
    if model.vip_cap >= model.eligible_count() {
        log::info!(
            "headcount cap {} does not bind ({} eligible households)",
            model.vip_cap,
            model.eligible_count()
        );
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::features::{prepare, HouseholdWeekRecord};
    use crate::pipeline::seasonal::SeasonalCalendar;

    fn rec(household: &str, week: i64, non_ob_spend: f64, perk_value: f64) -> HouseholdWeekRecord {
        HouseholdWeekRecord {
            household: household.to_string(),
            week,
            non_ob_spend,
            ob_spend: 0.0,
            fuel_gallons: 0.0,
            gc_spend: 0.0,
            cs_spend: 0.0,
            perk_value,
        }
    }

    fn create_test_features() -> PreparedFeatures {
        prepare(
            vec![
                rec("a", 3, 100.0, 0.5),
                rec("a", 5, 100.0, 0.5),
                rec("b", 7, 40.0, 0.01),
                rec("c", 2, 10.0, 0.9),
            ],
            &SeasonalCalendar::default(),
        )
    }

    #[test]
    fn test_constraint_layout() {
        let model = build_model(&create_test_features(), &SelectionParams::default()).unwrap();
        let constraints = model.constraints();

        assert_eq!(constraints.len(), 1 + 3 + 1);
        assert_eq!(constraints[0], ModelConstraint::HeadcountCap { limit: 6000 });
        assert_eq!(constraints[1], ModelConstraint::Exclusive { household: 0 });
        assert_eq!(constraints[3], ModelConstraint::Exclusive { household: 2 });
        assert_eq!(constraints[4], ModelConstraint::ForcedNonVip { household: 1 });
    }

    #[test]
    fn test_household_coefficients_sum_weeks() {
        let model = build_model(&create_test_features(), &SelectionParams::default()).unwrap();
        let a = model.household("a").unwrap();
        // week 3: 38.4 / 33.0, week 5: 33.0 / 33.0
        assert!((a.margin.vip - 71.4).abs() < 1e-9);
        assert!((a.margin.non_vip - 66.0).abs() < 1e-9);
        assert!(a.eligible);
        assert!(!model.household("b").unwrap().eligible);
        assert!(model.household("zzz").is_none());
    }

    #[test]
    fn test_objective_value_and_baseline() {
        let model = build_model(&create_test_features(), &SelectionParams::default()).unwrap();
        let all_non_vip: Vec<DecisionPair<f64>> = (0..3)
            .map(|_| DecisionPair {
                is_vip: 0.0,
                is_non_vip: 1.0,
            })
            .collect();
        assert!((model.objective_value(&all_non_vip) - model.baseline_value()).abs() < 1e-9);

        let mut a_vip = all_non_vip.clone();
        a_vip[0] = DecisionPair {
            is_vip: 1.0,
            is_non_vip: 0.0,
        };
        let gain = model.objective_value(&a_vip) - model.baseline_value();
        assert!((gain - 5.4).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut params = SelectionParams::default();
        params.margin_rates.fuel = f64::INFINITY;
        assert!(build_model(&create_test_features(), &params).is_err());
    }
}
