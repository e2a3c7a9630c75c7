//! vipselect: VIP Household Selection Library
//!
//! Chooses which households receive a promotional VIP treatment by solving a
//! binary program that maximizes projected margin under a headcount cap and
//! a perk-value eligibility filter.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
