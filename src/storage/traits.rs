//! Contracts for the stores and context the session engine consumes.

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::database::DatabaseError;
use crate::goals::types::{Goal, ProposedGoal};
use crate::recording::types::{DoneExerciseLogEntry, NewLogEntry};

/// Goal persistence.
pub trait GoalStore: Send + Sync {
    /// Active goals of `user_id` in `cycle`.
    fn list_active_goals(
        &self,
        user_id: Uuid,
        cycle: u32,
    ) -> impl Future<Output = Result<Vec<Goal>, StoreError>> + Send;

    /// Flip a goal's active flag, returning the updated goal.
    fn set_goal_active(
        &self,
        goal_id: Uuid,
        active: bool,
    ) -> impl Future<Output = Result<Goal, StoreError>> + Send;

    /// Create goals for `cycle` from accepted proposals.
    fn bulk_insert_goals(
        &self,
        user_id: Uuid,
        cycle: u32,
        proposals: &[ProposedGoal],
    ) -> impl Future<Output = Result<Vec<Goal>, StoreError>> + Send;

    /// Cycle numbers the user has goals in, ascending.
    fn list_cycles_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<u32>, StoreError>> + Send;
}

/// Append-only set log.
pub trait LogStore: Send + Sync {
    /// Store a set and return it with its id.
    fn append_entry(
        &self,
        entry: NewLogEntry,
    ) -> impl Future<Output = Result<DoneExerciseLogEntry, StoreError>> + Send;

    /// Every set `user_id` logged in `cycle`.
    fn list_entries_for_cycle(
        &self,
        user_id: Uuid,
        cycle: u32,
    ) -> impl Future<Output = Result<Vec<DoneExerciseLogEntry>, StoreError>> + Send;
}

/// Supplies the authenticated user, if any.
pub trait IdentityContext: Send + Sync {
    fn current_user_id(&self) -> Option<Uuid>;
}

/// Identity fixed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticIdentity(pub Option<Uuid>);

impl StaticIdentity {
    pub fn user(user_id: Uuid) -> Self {
        Self(Some(user_id))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityContext for StaticIdentity {
    fn current_user_id(&self) -> Option<Uuid> {
        self.0
    }
}

impl<T: GoalStore> GoalStore for Arc<T> {
    fn list_active_goals(
        &self,
        user_id: Uuid,
        cycle: u32,
    ) -> impl Future<Output = Result<Vec<Goal>, StoreError>> + Send {
        (**self).list_active_goals(user_id, cycle)
    }

    fn set_goal_active(
        &self,
        goal_id: Uuid,
        active: bool,
    ) -> impl Future<Output = Result<Goal, StoreError>> + Send {
        (**self).set_goal_active(goal_id, active)
    }

    fn bulk_insert_goals(
        &self,
        user_id: Uuid,
        cycle: u32,
        proposals: &[ProposedGoal],
    ) -> impl Future<Output = Result<Vec<Goal>, StoreError>> + Send {
        (**self).bulk_insert_goals(user_id, cycle, proposals)
    }

    fn list_cycles_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<u32>, StoreError>> + Send {
        (**self).list_cycles_for_user(user_id)
    }
}

impl<T: LogStore> LogStore for Arc<T> {
    fn append_entry(
        &self,
        entry: NewLogEntry,
    ) -> impl Future<Output = Result<DoneExerciseLogEntry, StoreError>> + Send {
        (**self).append_entry(entry)
    }

    fn list_entries_for_cycle(
        &self,
        user_id: Uuid,
        cycle: u32,
    ) -> impl Future<Output = Result<Vec<DoneExerciseLogEntry>, StoreError>> + Send {
        (**self).list_entries_for_cycle(user_id, cycle)
    }
}

/// A store round-trip failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Goal not found: {0}")]
    GoalNotFound(Uuid),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
