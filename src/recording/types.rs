//! Set log types.
//!
//! A logged set is immutable once stored. The engine only ever appends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::goals::types::Goal;

/// One completed set as stored in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoneExerciseLogEntry {
    /// Store-assigned identifier
    pub id: Uuid,
    /// Goal the set was performed against
    pub goal_id: Uuid,
    /// User who performed the set
    pub user_id: Uuid,
    /// Cycle number at time of logging
    pub cycle: u32,
    /// Reps performed
    pub reps: u32,
    /// Weight used in kg
    pub weight: Option<f64>,
    /// Time under work in seconds
    pub duration_seconds: Option<u32>,
    /// Set was attempted but failed
    pub failed: bool,
    pub notes: Option<String>,
    pub logged_at: DateTime<Utc>,
}

/// A set ready to be appended; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub cycle: u32,
    pub reps: u32,
    pub weight: Option<f64>,
    pub duration_seconds: Option<u32>,
    pub failed: bool,
    pub notes: Option<String>,
    pub logged_at: DateTime<Utc>,
}

impl NewLogEntry {
    /// Entry for `reps` against `goal`, logged now.
    pub fn for_goal(goal: &Goal, reps: u32) -> Self {
        Self {
            goal_id: goal.id,
            user_id: goal.user_id,
            cycle: goal.cycle,
            reps,
            weight: None,
            duration_seconds: None,
            failed: false,
            notes: None,
            logged_at: Utc::now(),
        }
    }

    /// Attach the store-assigned id.
    pub fn into_entry(self, id: Uuid) -> DoneExerciseLogEntry {
        DoneExerciseLogEntry {
            id,
            goal_id: self.goal_id,
            user_id: self.user_id,
            cycle: self.cycle,
            reps: self.reps,
            weight: self.weight,
            duration_seconds: self.duration_seconds,
            failed: self.failed,
            notes: self.notes,
            logged_at: self.logged_at,
        }
    }
}

/// What the user entered when logging a set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetData {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub duration_seconds: Option<u32>,
    pub failed: bool,
    pub notes: Option<String>,
    /// Rest to count down after this set; the configured default when absent
    pub rest_seconds: Option<u32>,
}

impl SetData {
    pub fn reps(reps: u32) -> Self {
        Self {
            reps: Some(reps),
            ..Default::default()
        }
    }

    pub fn timed(seconds: u32) -> Self {
        Self {
            duration_seconds: Some(seconds),
            ..Default::default()
        }
    }

    pub fn with_weight(mut self, weight_kg: f64) -> Self {
        self.weight = Some(weight_kg);
        self
    }

    pub fn with_rest(mut self, seconds: u32) -> Self {
        self.rest_seconds = Some(seconds);
        self
    }

    /// Check the set against what the goal requires.
    pub fn validate(&self, goal: &Goal) -> Result<(), ValidationError> {
        if goal.target_reps.is_some() && self.reps.is_none() {
            return Err(ValidationError::MissingReps {
                exercise: goal.exercise_name.clone(),
            });
        }
        if goal.target_duration_seconds.is_some() && self.duration_seconds.is_none() {
            return Err(ValidationError::MissingDuration {
                exercise: goal.exercise_name.clone(),
            });
        }
        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ValidationError::InvalidWeight(weight));
            }
        }
        Ok(())
    }

    /// Build the log entry for `goal`; call [`SetData::validate`] first.
    pub fn to_entry(&self, goal: &Goal) -> NewLogEntry {
        NewLogEntry {
            goal_id: goal.id,
            user_id: goal.user_id,
            cycle: goal.cycle,
            reps: self.reps.unwrap_or(0),
            weight: self.weight,
            duration_seconds: self.duration_seconds,
            failed: self.failed,
            notes: self.notes.clone(),
            logged_at: Utc::now(),
        }
    }
}

/// A set submission missing something the goal requires.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Reps are required for {exercise}")]
    MissingReps { exercise: String },

    #[error("Duration is required for {exercise}")]
    MissingDuration { exercise: String },

    #[error("Invalid weight: {0}")]
    InvalidWeight(f64),
}
