//! Solver-based VIP selection using Mixed Integer Programming (MIP)
//!
//! The model is built independently of any solver; a `MipBackend` turns it
//! into a concrete problem. The default backend is HiGHS via good_lp.

mod model;
mod objective;

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use serde::Serialize;

use super::error::{SelectionError, SelectionResult};

pub use model::{build_model, DecisionPair, HouseholdTerm, ModelConstraint, SelectionModel};
pub use objective::{household_margin, record_margin, BranchMargin};

/// Values further than this from 0 or 1 are treated as fractional
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Terminal state reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    NotSolved,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::Unbounded => "Unbounded",
            SolveStatus::NotSolved => "Not Solved",
        };
        write!(f, "{}", s)
    }
}

/// Raw result from a backend
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Objective at the returned assignment, when there is one
    pub objective_value: Option<f64>,
    /// Variable values in household order; empty unless a solution was found
    pub assignment: Vec<DecisionPair<f64>>,
}

impl SolveOutcome {
    /// Outcome for a run that produced no assignment
    pub fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            objective_value: None,
            assignment: Vec::new(),
        }
    }

    /// Convert to per-household decisions.
    ///
    /// Fails unless the status is optimal and every pair is an exact 0/1
    /// split.
    pub fn into_selection(self, model: &SelectionModel) -> SelectionResult<Selection> {
        if self.status != SolveStatus::Optimal {
            return Err(SelectionError::SolverFailed {
                status: self.status,
            });
        }
        if self.assignment.len() != model.households().len() {
            return Err(SelectionError::SolverFailed {
                status: SolveStatus::NotSolved,
            });
        }

        let mut rounded = Vec::with_capacity(self.assignment.len());
        let mut decisions = Vec::with_capacity(self.assignment.len());
        for (term, pair) in model.households().iter().zip(&self.assignment) {
            let is_vip = to_binary(&term.household, pair.is_vip)?;
            let is_non_vip = to_binary(&term.household, pair.is_non_vip)?;
            if is_vip + is_non_vip != 1.0 {
                return Err(SelectionError::InconsistentAssignment {
                    household: term.household.clone(),
                });
            }
            rounded.push(DecisionPair { is_vip, is_non_vip });
            decisions.push(HouseholdDecision {
                household: term.household.clone(),
                vip: is_vip == 1.0,
            });
        }

        Ok(Selection {
            status: self.status,
            objective_value: model.objective_value(&rounded),
            baseline_value: model.baseline_value(),
            decisions,
        })
    }
}

fn to_binary(household: &str, value: f64) -> SelectionResult<f64> {
    let rounded = value.round();
    if (value - rounded).abs() > INTEGRALITY_TOLERANCE || !(rounded == 0.0 || rounded == 1.0) {
        return Err(SelectionError::NonIntegral {
            household: household.to_string(),
            value,
        });
    }
    Ok(rounded)
}

/// Final decision for one household
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdDecision {
    pub household: String,
    pub vip: bool,
}

impl HouseholdDecision {
    /// Decision as written to the output table
    pub fn flag(&self) -> f64 {
        if self.vip {
            1.0
        } else {
            0.0
        }
    }
}

/// Solved selection with its objective
#[derive(Debug, Clone)]
pub struct Selection {
    pub status: SolveStatus,
    pub objective_value: f64,
    /// Objective if nobody were VIP
    pub baseline_value: f64,
    /// One decision per household, in model order
    pub decisions: Vec<HouseholdDecision>,
}

impl Selection {
    pub fn vip_count(&self) -> usize {
        self.decisions.iter().filter(|d| d.vip).count()
    }

    /// Margin gained over leaving every household non-VIP
    pub fn lift(&self) -> f64 {
        self.objective_value - self.baseline_value
    }
}

/// A MIP solver capable of solving a selection model
pub trait MipBackend {
    /// Short name for reports
    fn name(&self) -> &'static str;

    /// Maximize the model objective. Solver-level failures are reported via
    /// `SolveOutcome::status`, not as errors.
    fn solve(&self, model: &SelectionModel) -> SelectionResult<SolveOutcome>;
}

/// HiGHS through good_lp
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsBackend;

impl MipBackend for HighsBackend {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, model: &SelectionModel) -> SelectionResult<SolveOutcome> {
        let mut vars = ProblemVariables::new();

        let slots: Vec<DecisionPair<Variable>> = model
            .households()
            .iter()
            .map(|_| DecisionPair {
                is_vip: vars.add(variable().binary()),
                is_non_vip: vars.add(variable().binary()),
            })
            .collect();

        let objective: Expression = model
            .households()
            .iter()
            .zip(&slots)
            .map(|(term, slot)| term.margin.vip * slot.is_vip + term.margin.non_vip * slot.is_non_vip)
            .sum();

        let mut problem = vars.maximise(objective).using(default_solver);

        let constraints = model.constraints();
        log::debug!(
            "solving with {} variables and {} constraints",
            2 * slots.len(),
            constraints.len()
        );

        for c in constraints {
            match c {
                ModelConstraint::HeadcountCap { limit } => {
                    let headcount: Expression = slots.iter().map(|s| s.is_vip).sum();
                    problem = problem.with(constraint!(headcount <= limit as f64));
                }
                ModelConstraint::Exclusive { household } => {
                    let slot = &slots[household];
                    let pair: Expression = slot.is_vip + slot.is_non_vip;
                    problem = problem.with(constraint!(pair == 1.0));
                }
                ModelConstraint::ForcedNonVip { household } => {
                    let vip: Expression = slots[household].is_vip.into();
                    problem = problem.with(constraint!(vip == 0.0));
                }
            }
        }

        let solution = match problem.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => return Ok(SolveOutcome::failed(SolveStatus::Infeasible)),
            Err(ResolutionError::Unbounded) => return Ok(SolveOutcome::failed(SolveStatus::Unbounded)),
            Err(e) => {
                log::warn!("HiGHS did not solve the model: {}", e);
                return Ok(SolveOutcome::failed(SolveStatus::NotSolved));
            }
        };

        let assignment: Vec<DecisionPair<f64>> = slots
            .iter()
            .map(|slot| DecisionPair {
                is_vip: solution.value(slot.is_vip),
                is_non_vip: solution.value(slot.is_non_vip),
            })
            .collect();

        Ok(SolveOutcome {
            status: SolveStatus::Optimal,
            objective_value: Some(model.objective_value(&assignment)),
            assignment,
        })
    }
}

/// Solve a model with the given backend and extract decisions
pub fn solve_selection(model: &SelectionModel, backend: &dyn MipBackend) -> SelectionResult<Selection> {
    let outcome = backend.solve(model)?;
    log::info!(
        "{} finished with status {}{}",
        backend.name(),
        outcome.status,
        outcome
            .objective_value
            .map(|v| format!(", objective {:.4}", v))
            .unwrap_or_default()
    );
    outcome.into_selection(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::features::{prepare, HouseholdWeekRecord};
    use crate::pipeline::params::SelectionParams;
    use crate::pipeline::seasonal::SeasonalCalendar;

    fn create_test_model(vip_cap: usize) -> SelectionModel {
        let records = vec![
            HouseholdWeekRecord {
                household: "a".to_string(),
                week: 3,
                non_ob_spend: 100.0,
                ob_spend: 0.0,
                fuel_gallons: 0.0,
                gc_spend: 0.0,
                cs_spend: 0.0,
                perk_value: 0.5,
            },
            HouseholdWeekRecord {
                household: "b".to_string(),
                week: 4,
                non_ob_spend: 100.0,
                ob_spend: 0.0,
                fuel_gallons: 0.0,
                gc_spend: 0.0,
                cs_spend: 0.0,
                perk_value: 0.5,
            },
        ];
        let features = prepare(records, &SeasonalCalendar::default());
        let params = SelectionParams {
            vip_cap,
            ..Default::default()
        };
        build_model(&features, &params).unwrap()
    }

    struct FixedBackend(SolveOutcome);

    impl MipBackend for FixedBackend {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn solve(&self, _model: &SelectionModel) -> SelectionResult<SolveOutcome> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_highs_selects_profitable_household() {
        let model = create_test_model(1);
        let selection = solve_selection(&model, &HighsBackend).unwrap();

        assert_eq!(selection.status, SolveStatus::Optimal);
        assert_eq!(selection.vip_count(), 1);
        assert_eq!(selection.decisions[0].household, "a");
        assert!(selection.decisions[0].vip);
        // b: week 4 VIP margin 0.9 * 32 = 28.8 < 33
        assert!(!selection.decisions[1].vip);
        assert!((selection.lift() - 5.4).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_outcome_is_an_error() {
        let model = create_test_model(1);
        let backend = FixedBackend(SolveOutcome::failed(SolveStatus::Infeasible));
        let err = solve_selection(&model, &backend).unwrap_err();
        assert!(matches!(
            err,
            SelectionError::SolverFailed {
                status: SolveStatus::Infeasible
            }
        ));
    }

    #[test]
    fn test_fractional_assignment_rejected() {
        let model = create_test_model(1);
        let backend = FixedBackend(SolveOutcome {
            status: SolveStatus::Optimal,
            objective_value: None,
            assignment: vec![
                DecisionPair {
                    is_vip: 0.5,
                    is_non_vip: 0.5,
                },
                DecisionPair {
                    is_vip: 0.0,
                    is_non_vip: 1.0,
                },
            ],
        });
        let err = solve_selection(&model, &backend).unwrap_err();
        assert!(matches!(err, SelectionError::NonIntegral { ref household, .. } if household == "a"));
    }

    #[test]
    fn test_pair_must_be_exclusive() {
        let model = create_test_model(2);
        let backend = FixedBackend(SolveOutcome {
            status: SolveStatus::Optimal,
            objective_value: None,
            assignment: vec![
                DecisionPair {
                    is_vip: 1.0,
                    is_non_vip: 1.0,
                },
                DecisionPair {
                    is_vip: 0.0,
                    is_non_vip: 1.0,
                },
            ],
        });
        let err = solve_selection(&model, &backend).unwrap_err();
        assert!(matches!(err, SelectionError::InconsistentAssignment { .. }));
    }

    #[test]
    fn test_near_integral_values_are_rounded() {
        let model = create_test_model(1);
        let backend = FixedBackend(SolveOutcome {
            status: SolveStatus::Optimal,
            objective_value: None,
            assignment: vec![
                DecisionPair {
                    is_vip: 1.0 - 1e-9,
                    is_non_vip: 1e-9,
                },
                DecisionPair {
                    is_vip: 0.0,
                    is_non_vip: 1.0,
                },
            ],
        });
        let selection = solve_selection(&model, &backend).unwrap();
        assert_eq!(selection.decisions[0].flag(), 1.0);
        assert_eq!(selection.decisions[1].flag(), 0.0);
    }

    #[test]
    fn test_status_display_matches_report_names() {
        assert_eq!(SolveStatus::NotSolved.to_string(), "Not Solved");
        assert_eq!(SolveStatus::Optimal.to_string(), "Optimal");
    }
}
