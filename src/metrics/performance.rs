//! Per-goal performance aggregation over a cycle's log entries.

use serde::{Deserialize, Serialize};

use crate::goals::types::Goal;
use crate::recording::types::DoneExerciseLogEntry;

/// Aggregate statistics for one goal over its logged sets in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// Number of sets logged
    pub total_sets: u32,
    /// Sum of reps across all sets
    pub total_reps: u32,
    /// Mean reps per set (one decimal)
    pub average_reps: f64,
    /// Mean weight per set in kg, unweighted sets count as zero (one decimal)
    pub average_weight: f64,
    /// Sum of reps x weight (one decimal)
    pub total_volume: f64,
    /// Heaviest single set in kg (one decimal)
    pub max_weight: f64,
    /// Most reps in a single set
    pub max_reps: u32,
    /// Sets meeting the per-set rep target
    pub sets_meeting_target: u32,
    /// Set target and average rep target both met
    pub was_completed: bool,
    /// Planned sets for reference
    pub planned_sets: u32,
    /// Planned reps per set for reference
    pub planned_reps: u32,
}

/// Fraction of a plan achieved, zero when nothing was planned.
pub fn compliance(actual: f64, planned: u32) -> f64 {
    if planned == 0 {
        0.0
    } else {
        actual / planned as f64
    }
}

/// Round to one decimal place, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute the snapshot for `goal` from `entries`.
///
/// Entries for other goals are ignored. The result does not depend on the
/// order of `entries`.
pub fn aggregate(goal: &Goal, entries: &[DoneExerciseLogEntry]) -> PerformanceSnapshot {
    let target_reps = goal.planned_reps();

    let mut total_sets = 0u32;
    let mut total_reps = 0u32;
    let mut sum_weights = 0.0f64;
    let mut total_volume = 0.0f64;
    let mut max_weight = 0.0f64;
    let mut max_reps = 0u32;
    let mut sets_meeting_target = 0u32;

    for entry in entries.iter().filter(|e| e.goal_id == goal.id) {
        let weight = entry.weight.unwrap_or(0.0);

        total_sets += 1;
        total_reps += entry.reps;
        sum_weights += weight;
        total_volume += entry.reps as f64 * weight;
        max_weight = max_weight.max(weight);
        max_reps = max_reps.max(entry.reps);

        if entry.reps >= target_reps {
            sets_meeting_target += 1;
        }
    }

    let (average_reps, average_weight) = if total_sets > 0 {
        (
            round1(total_reps as f64 / total_sets as f64),
            round1(sum_weights / total_sets as f64),
        )
    } else {
        (0.0, 0.0)
    };

    let was_completed = total_sets >= goal.target_sets && average_reps >= target_reps as f64;

    PerformanceSnapshot {
        total_sets,
        total_reps,
        average_reps,
        average_weight,
        total_volume: round1(total_volume),
        max_weight: round1(max_weight),
        max_reps,
        sets_meeting_target,
        was_completed,
        planned_sets: goal.target_sets,
        planned_reps: target_reps,
    }
}
