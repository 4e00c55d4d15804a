//! Cycle-to-cycle progression.
//!
//! Turns a goal and its performance over the previous cycle into a proposed
//! target for the next cycle.

pub mod advisor;
pub mod rules;

pub use advisor::ProgressionAdvisor;
pub use rules::{
    Adjustment, ProgressionConfig, ProgressionKind, ProgressionRule, RuleContext, RULES,
};
