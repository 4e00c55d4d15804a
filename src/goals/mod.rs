//! Workout goals module.
//!
//! Covers the planned exercise targets of a training cycle:
//! - Goal and next-cycle proposal types
//! - The filtered goal pool for the active cycle
//! - Non-repeating selection of the next exercise

pub mod pool;
pub mod selector;
pub mod types;

// Re-exports for convenience
pub use pool::{tag_set, GoalPool};
pub use selector::{select_next, ExerciseSelector};
pub use types::{Goal, ProposedGoal};
