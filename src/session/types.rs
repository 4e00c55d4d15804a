//! Session types: phases, events, commands and errors.

use std::collections::BTreeSet;
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::goals::types::{Goal, ProposedGoal};
use crate::metrics::performance::PerformanceSnapshot;
use crate::recording::types::{SetData, ValidationError};
use crate::storage::traits::StoreError;
use crate::timer::{TimerKind, TimerState};

/// Lifecycle of the session's current-goal slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Nothing to do: no cycle loaded or no candidates
    #[default]
    NoGoal,
    /// A goal is current and commands are accepted
    Active,
    /// A set is being written and performance refreshed
    LoggingSet,
    /// The current goal is being paused in the goal store
    PausingGoal,
    /// Cycle data is loading or next-cycle goals are being written
    Refreshing,
    /// The session ended; no further commands are accepted
    TornDown,
}

impl SessionPhase {
    /// Whether a store round-trip is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionPhase::LoggingSet | SessionPhase::PausingGoal | SessionPhase::Refreshing
        )
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::NoGoal => write!(f, "No Goal"),
            SessionPhase::Active => write!(f, "Active"),
            SessionPhase::LoggingSet => write!(f, "Logging Set"),
            SessionPhase::PausingGoal => write!(f, "Pausing Goal"),
            SessionPhase::Refreshing => write!(f, "Refreshing"),
            SessionPhase::TornDown => write!(f, "Torn Down"),
        }
    }
}

/// Point-in-time view of a session for display.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub cycle: Option<u32>,
    pub current_goal: Option<Goal>,
    pub exercise_timer: TimerState,
    pub rest_timer: TimerState,
}

/// Events broadcast by the session controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A cycle's goals and log were loaded
    CycleSelected { cycle: u32, goal_count: usize },
    /// A new goal became current
    GoalChanged { goal_id: Uuid, exercise_name: String },
    /// No candidate goal is left
    NoGoal,
    /// A set was stored
    SetLogged { entry_id: Uuid, goal_id: Uuid },
    /// A goal's performance was recomputed
    PerformanceUpdated {
        goal_id: Uuid,
        snapshot: PerformanceSnapshot,
    },
    /// A running timer advanced
    TimerTicked { kind: TimerKind, remaining: u32 },
    /// A timer was paused by the user
    TimerPaused { kind: TimerKind, remaining: u32 },
    /// A timer reached zero
    TimerCompleted { kind: TimerKind },
    /// Controls should be disabled (true) or re-enabled (false)
    BusyChanged(bool),
    /// The session ended
    TornDown,
}

/// Commands accepted by a running session.
#[derive(Debug)]
pub enum SessionCommand {
    SelectCycle(u32),
    LoadLatestCycle,
    SetFilters {
        categories: BTreeSet<String>,
        equipment: BTreeSet<String>,
    },
    SkipGoal,
    LogSet(SetData),
    PauseGoal,
    ChangeGoal(Goal),
    StartTimer(TimerKind),
    PauseTimer(TimerKind),
    ResetTimer { kind: TimerKind, seconds: u32 },
    CommitNextCycle(Vec<ProposedGoal>),
    TimerRemaining {
        kind: TimerKind,
        reply: oneshot::Sender<u32>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    ProposeNextCycle {
        reply: oneshot::Sender<Vec<ProposedGoal>>,
    },
}

/// Session operation errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No user is signed in")]
    NoUser,

    #[error("No exercise is selected")]
    NoCurrentGoal,

    #[error("Goal {0} is not an active goal of the loaded cycle")]
    UnknownGoal(Uuid),

    #[error("Another operation is still in progress")]
    Busy,

    #[error("Session has ended")]
    TornDown,
}
