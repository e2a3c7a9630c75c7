//! Pipeline module - load, prepare, model, solve, write

pub mod error;
pub mod features;
pub mod loader;
pub mod params;
pub mod seasonal;
pub mod solver;
pub mod writer;

pub use error::*;
pub use features::*;
pub use loader::*;
pub use params::*;
pub use seasonal::*;
pub use solver::{
    build_model, solve_selection, BranchMargin, DecisionPair, HighsBackend, HouseholdDecision,
    MipBackend, ModelConstraint, Selection, SelectionModel, SolveOutcome, SolveStatus,
};
pub use writer::*;
