//! Next-exercise selection.

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use super::types::Goal;

/// Picks the next goal uniformly at random, avoiding an immediate repeat.
#[derive(Debug, Clone)]
pub struct ExerciseSelector<R = StdRng> {
    rng: R,
}

impl ExerciseSelector<StdRng> {
    /// Selector seeded from the thread-local generator.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Deterministic selector for reproducible sessions and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ExerciseSelector<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ExerciseSelector<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Choose the next goal, skipping `exclude` when another goal is available.
    pub fn select_next<'a>(
        &mut self,
        candidates: &'a [Goal],
        exclude: Option<Uuid>,
    ) -> Option<&'a Goal> {
        select_next(candidates, exclude, &mut self.rng)
    }
}

/// Choose a goal from `candidates`, never returning `exclude` unless it is
/// the only option.
pub fn select_next<'a, R>(
    candidates: &'a [Goal],
    exclude: Option<Uuid>,
    rng: &mut R,
) -> Option<&'a Goal>
where
    R: Rng + ?Sized,
{
    if candidates.is_empty() {
        return None;
    }

    if let Some(excluded) = exclude {
        if candidates.len() > 1 {
            if let Some(goal) = candidates.iter().filter(|g| g.id != excluded).choose(rng) {
                tracing::debug!("Selected {} (excluding {})", goal.exercise_name, excluded);
                return Some(goal);
            }
        }
    }

    candidates.iter().choose(rng)
}
