//! Goal type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::metrics::performance::PerformanceSnapshot;
use crate::progression::rules::ProgressionKind;

/// A planned exercise target within a training cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier
    pub id: Uuid,
    /// User who owns this goal
    pub user_id: Uuid,
    /// Training cycle (microcycle) this goal belongs to
    pub cycle: u32,
    /// Exercise name shown to the user
    pub exercise_name: String,
    /// Target number of sets
    pub target_sets: u32,
    /// Target reps per set
    pub target_reps: Option<u32>,
    /// Target weight in kilograms
    pub target_weight: Option<f64>,
    /// Per-set time target in seconds
    pub target_duration_seconds: Option<u32>,
    /// Category tags (push, pull, core, ...)
    pub categories: BTreeSet<String>,
    /// Equipment tags (barbell, bands, ...)
    pub equipment: BTreeSet<String>,
    /// Paused goals are inactive
    pub active: bool,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the goal was created
    pub created_at: DateTime<Utc>,
    /// Performance derived from the cycle's log, never stored
    #[serde(default, skip_serializing)]
    pub performance: Option<PerformanceSnapshot>,
}

impl Goal {
    /// Create a new active goal with only a set target.
    pub fn new(
        user_id: Uuid,
        cycle: u32,
        exercise_name: impl Into<String>,
        target_sets: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            cycle,
            exercise_name: exercise_name.into(),
            target_sets,
            target_reps: None,
            target_weight: None,
            target_duration_seconds: None,
            categories: BTreeSet::new(),
            equipment: BTreeSet::new(),
            active: true,
            notes: None,
            created_at: Utc::now(),
            performance: None,
        }
    }

    pub fn with_reps(mut self, reps: u32) -> Self {
        self.target_reps = Some(reps);
        self
    }

    pub fn with_weight(mut self, weight_kg: f64) -> Self {
        self.target_weight = Some(weight_kg);
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.target_duration_seconds = Some(seconds);
        self
    }

    pub fn with_categories<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_equipment<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.equipment = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether sets for this goal are counted down by the exercise timer.
    pub fn is_timed(&self) -> bool {
        self.target_duration_seconds.is_some()
    }

    /// Target reps, treating "no target" as zero.
    pub fn planned_reps(&self) -> u32 {
        self.target_reps.unwrap_or(0)
    }

    /// Short human-readable target, e.g. `3 x 10 @ 60 kg`.
    pub fn target_summary(&self) -> String {
        let mut summary = match (self.target_reps, self.target_duration_seconds) {
            (Some(reps), _) => format!("{} x {}", self.target_sets, reps),
            (None, Some(secs)) => format!("{} x {}s", self.target_sets, secs),
            (None, None) => format!("{} sets", self.target_sets),
        };
        if let Some(weight) = self.target_weight {
            summary.push_str(&format!(" @ {} kg", weight));
        }
        summary
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.exercise_name, self.target_summary())
    }
}

/// A candidate goal for the next cycle, reviewed before it is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedGoal {
    /// Goal this proposal was derived from
    pub source_goal_id: Uuid,
    pub exercise_name: String,
    pub target_sets: u32,
    pub target_reps: Option<u32>,
    pub target_weight: Option<f64>,
    pub target_duration_seconds: Option<u32>,
    pub categories: BTreeSet<String>,
    pub equipment: BTreeSet<String>,
    pub notes: Option<String>,
    /// Performance the proposal was based on
    pub snapshot: Option<PerformanceSnapshot>,
    /// Which progression tier produced the proposal
    pub progression: ProgressionKind,
    /// Explanation shown to the user
    pub rationale: String,
    /// Whether the user keeps this proposal when committing
    pub include: bool,
}

impl ProposedGoal {
    /// Start a proposal that repeats `goal` unchanged.
    pub fn from_goal(goal: &Goal, snapshot: Option<PerformanceSnapshot>) -> Self {
        Self {
            source_goal_id: goal.id,
            exercise_name: goal.exercise_name.clone(),
            target_sets: goal.target_sets,
            target_reps: goal.target_reps,
            target_weight: goal.target_weight,
            target_duration_seconds: goal.target_duration_seconds,
            categories: goal.categories.clone(),
            equipment: goal.equipment.clone(),
            notes: goal.notes.clone(),
            snapshot,
            progression: ProgressionKind::NoData,
            rationale: String::new(),
            include: true,
        }
    }

    /// Turn an accepted proposal into a goal of `cycle`.
    pub fn into_goal(self, user_id: Uuid, cycle: u32) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id,
            cycle,
            exercise_name: self.exercise_name,
            target_sets: self.target_sets,
            target_reps: self.target_reps,
            target_weight: self.target_weight,
            target_duration_seconds: self.target_duration_seconds,
            categories: self.categories,
            equipment: self.equipment,
            active: true,
            notes: self.notes,
            created_at: Utc::now(),
            performance: None,
        }
    }
}
