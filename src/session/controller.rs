//! Session controller.
//!
//! Owns the current-goal slot, both timers and the goal pool of one workout
//! session. An operation that touches a store awaits every call it depends on
//! before changing any field, so a failed call leaves the controller exactly as
//! it was before the operation started.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::clock::SessionClock;
use super::types::{SessionCommand, SessionError, SessionEvent, SessionPhase, SessionSnapshot};
use crate::alerts::{Notification, NotificationSink};
use crate::goals::{ExerciseSelector, Goal, GoalPool, ProposedGoal};
use crate::metrics::{aggregate, PerformanceSnapshot};
use crate::progression::{ProgressionAdvisor, ProgressionConfig};
use crate::recording::{DoneExerciseLogEntry, SetData};
use crate::storage::{GoalStore, IdentityContext, LogStore, SessionSettings, StoreError};
use crate::timer::{TimerKind, TimerState};

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 256;

/// Drives one workout session.
pub struct SessionController<G, L, I, N> {
    goal_store: G,
    log_store: L,
    identity: I,
    notifier: Arc<N>,
    pool: GoalPool,
    selector: ExerciseSelector,
    advisor: ProgressionAdvisor,
    settings: SessionSettings,
    cycle: Option<u32>,
    current: Option<Goal>,
    /// Log of the loaded cycle as last read from the store
    log: Vec<DoneExerciseLogEntry>,
    phase: SessionPhase,
    clock: SessionClock<N>,
    events: broadcast::Sender<SessionEvent>,
}

impl<G, L, I, N> SessionController<G, L, I, N>
where
    G: GoalStore,
    L: LogStore,
    I: IdentityContext,
    N: NotificationSink,
{
    /// Create a session with default settings and a randomly seeded selector.
    pub fn new(goal_store: G, log_store: L, identity: I, notifier: N) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let notifier = Arc::new(notifier);
        Self {
            goal_store,
            log_store,
            identity,
            clock: SessionClock::new(events.clone(), notifier.clone()),
            notifier,
            pool: GoalPool::new(),
            selector: ExerciseSelector::new(),
            advisor: ProgressionAdvisor::default(),
            settings: SessionSettings::default(),
            cycle: None,
            current: None,
            log: Vec::new(),
            phase: SessionPhase::NoGoal,
            events,
        }
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_progression(mut self, config: ProgressionConfig) -> Self {
        self.advisor = ProgressionAdvisor::new(config);
        self
    }

    pub fn with_selector(mut self, selector: ExerciseSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    /// Shared handle to both timers. Ticking it is the same as calling
    /// [`tick`](Self::tick), and works while an operation is awaiting a store.
    pub fn clock(&self) -> SessionClock<N> {
        self.clock.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether a store round-trip is in flight and controls are disabled.
    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    pub fn cycle(&self) -> Option<u32> {
        self.cycle
    }

    pub fn current_goal(&self) -> Option<&Goal> {
        self.current.as_ref()
    }

    pub fn pool(&self) -> &GoalPool {
        &self.pool
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Point-in-time view for display.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            cycle: self.cycle,
            current_goal: self.current.clone(),
            exercise_timer: self.clock.state(TimerKind::Exercise),
            rest_timer: self.clock.state(TimerKind::Rest),
        }
    }

    // ---------------------------------------------------------------------
    // Cycle loading and filtering
    // ---------------------------------------------------------------------

    /// Load the active goals and the log of `cycle`, attach performance to
    /// every goal and reconcile the current goal against the new pool.
    pub async fn select_cycle(&mut self, cycle: u32) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let user_id = self.user_id()?;
        let previous = self.begin(SessionPhase::Refreshing);

        let listed = self.goal_store.list_active_goals(user_id, cycle).await;
        let goals = match listed {
            Ok(goals) => goals,
            Err(e) => return Err(self.fail(previous, "load cycle", e)),
        };

        let listed = self.log_store.list_entries_for_cycle(user_id, cycle).await;
        let entries = match listed {
            Ok(entries) => entries,
            Err(e) => return Err(self.fail(previous, "load cycle", e)),
        };

        let goals = attach_performance(goals, &entries);
        tracing::info!(
            "Selected cycle {} ({} active goals, {} logged sets)",
            cycle,
            goals.len(),
            entries.len()
        );

        self.cycle = Some(cycle);
        self.log = entries;
        self.pool.set_goals(goals);
        self.emit(SessionEvent::CycleSelected {
            cycle,
            goal_count: self.pool.len(),
        });
        self.finish(previous);
        self.reconcile();
        Ok(())
    }

    /// Select the user's highest cycle. Returns the cycle, or `None` when the
    /// user has no goals at all.
    pub async fn load_latest_cycle(&mut self) -> Result<Option<u32>, SessionError> {
        self.ensure_ready()?;
        let user_id = self.user_id()?;
        let previous = self.begin(SessionPhase::Refreshing);

        let listed = self.goal_store.list_cycles_for_user(user_id).await;
        let cycles = match listed {
            Ok(cycles) => cycles,
            Err(e) => return Err(self.fail(previous, "load cycles", e)),
        };
        self.finish(previous);

        match cycles.into_iter().max() {
            Some(cycle) => {
                self.select_cycle(cycle).await?;
                Ok(Some(cycle))
            }
            None => {
                tracing::info!("No cycles for user {}", user_id);
                self.set_current(None);
                Ok(None)
            }
        }
    }

    /// Replace the category and equipment filters. The current goal is kept
    /// while it still passes them.
    pub fn set_filters(
        &mut self,
        categories: BTreeSet<String>,
        equipment: BTreeSet<String>,
    ) -> Result<(), SessionError> {
        self.ensure_ready()?;
        tracing::debug!("Filters: categories {:?}, equipment {:?}", categories, equipment);
        self.pool.set_filters(categories, equipment);
        self.reconcile();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Current goal
    // ---------------------------------------------------------------------

    /// Move to another candidate without logging anything.
    pub fn skip_goal(&mut self) -> Result<Option<&Goal>, SessionError> {
        self.ensure_ready()?;
        let exclude = self.current.as_ref().map(|g| g.id);
        let candidates = self.pool.filtered_candidates();
        let next = self.selector.select_next(&candidates, exclude).cloned();
        self.set_current(next);
        Ok(self.current.as_ref())
    }

    /// Make `goal` current, whatever the filters say. Only active goals of
    /// the loaded cycle can be chosen.
    pub fn change_goal(&mut self, goal: Goal) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let Some(goal) = self.pool.get(goal.id).filter(|g| g.active).cloned() else {
            tracing::debug!("Rejected goal change to {}", goal.exercise_name);
            return Err(SessionError::UnknownGoal(goal.id));
        };
        self.set_current(Some(goal));
        Ok(())
    }

    /// Record a set against the current goal, refresh its performance, start
    /// the rest timer and advance to another goal.
    pub async fn log_set(&mut self, set: SetData) -> Result<DoneExerciseLogEntry, SessionError> {
        self.ensure_ready()?;
        let goal = self.current.clone().ok_or(SessionError::NoCurrentGoal)?;
        let user_id = self.user_id()?;

        if let Err(e) = set.validate(&goal) {
            tracing::debug!("Rejected set: {}", e);
            self.notifier.notify(Notification::error(e.to_string()));
            return Err(e.into());
        }

        let previous = self.begin(SessionPhase::LoggingSet);

        let mut new_entry = set.to_entry(&goal);
        new_entry.user_id = user_id;
        let appended = self.log_store.append_entry(new_entry).await;
        let stored = match appended {
            Ok(entry) => entry,
            Err(e) => return Err(self.fail(previous, "log set", e)),
        };

        // The set is stored from here on; a failed re-read keeps it
        let listed = self.log_store.list_entries_for_cycle(user_id, goal.cycle).await;
        match listed {
            Ok(entries) => self.log = entries,
            Err(e) => {
                tracing::warn!("Could not refresh performance, using the cached log: {}", e);
                self.notifier.notify(Notification::error(format!(
                    "Set saved, but performance may be out of date: {}",
                    e
                )));
                if !self.log.iter().any(|entry| entry.id == stored.id) {
                    self.log.push(stored.clone());
                }
            }
        }

        let snapshot = aggregate(&goal, &self.log);
        tracing::info!(
            "Logged set of {} ({} of {} sets)",
            goal.exercise_name,
            snapshot.total_sets,
            goal.target_sets
        );
        self.pool.set_performance(goal.id, snapshot.clone());
        self.emit(SessionEvent::SetLogged {
            entry_id: stored.id,
            goal_id: goal.id,
        });
        self.emit(SessionEvent::PerformanceUpdated {
            goal_id: goal.id,
            snapshot,
        });
        self.notifier
            .notify(Notification::success(format!("Logged set of {}", goal.exercise_name)));

        let rest = set.rest_seconds.unwrap_or(self.settings.default_rest_seconds);
        self.clock.with(TimerKind::Rest, |timer| {
            timer.reset(rest);
            timer.start();
        });

        self.finish(previous);
        let candidates = self.pool.filtered_candidates();
        let next = self.selector.select_next(&candidates, Some(goal.id)).cloned();
        self.set_current(next);
        Ok(stored)
    }

    /// Deactivate the current goal in the store and advance.
    pub async fn pause_goal(&mut self) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let goal = self.current.clone().ok_or(SessionError::NoCurrentGoal)?;
        let previous = self.begin(SessionPhase::PausingGoal);

        let updated = self.goal_store.set_goal_active(goal.id, false).await;
        if let Err(e) = updated {
            return Err(self.fail(previous, "pause goal", e));
        }

        tracing::info!("Paused {}", goal.exercise_name);
        self.pool.remove(goal.id);
        self.notifier
            .notify(Notification::success(format!("Paused {}", goal.exercise_name)));

        self.finish(previous);
        let candidates = self.pool.filtered_candidates();
        let next = self.selector.select_next(&candidates, Some(goal.id)).cloned();
        self.set_current(next);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Timers
    // ---------------------------------------------------------------------

    /// Start or resume a timer. Returns whether it is now running.
    pub fn start_timer(&mut self, kind: TimerKind) -> Result<bool, SessionError> {
        self.ensure_alive()?;
        Ok(self.clock.with(kind, |timer| timer.start()))
    }

    /// Pause a timer, returning the remaining seconds if it was running.
    pub fn pause_timer(&mut self, kind: TimerKind) -> Result<Option<u32>, SessionError> {
        self.ensure_alive()?;
        let paused = self.clock.with(kind, |timer| timer.pause());
        if let Some(remaining) = paused {
            self.emit(SessionEvent::TimerPaused { kind, remaining });
        }
        Ok(paused)
    }

    pub fn reset_timer(&mut self, kind: TimerKind, seconds: u32) -> Result<(), SessionError> {
        self.ensure_alive()?;
        self.clock.with(kind, |timer| timer.reset(seconds));
        Ok(())
    }

    pub fn timer_remaining(&self, kind: TimerKind) -> u32 {
        self.clock.remaining(kind)
    }

    pub fn timer_state(&self, kind: TimerKind) -> TimerState {
        self.clock.state(kind)
    }

    /// Rest to pre-fill when logging: what is left on the exercise timer if
    /// it was stopped mid-countdown, otherwise the configured default.
    pub fn suggested_rest_seconds(&self) -> u32 {
        match self.clock.remaining(TimerKind::Exercise) {
            0 => self.settings.default_rest_seconds,
            remaining => remaining,
        }
    }

    /// Advance both timers by one second.
    pub fn tick(&self) {
        if self.phase == SessionPhase::TornDown {
            return;
        }
        self.clock.tick();
    }

    // ---------------------------------------------------------------------
    // Cycle boundary
    // ---------------------------------------------------------------------

    /// Every goal of the loaded cycle with its performance.
    pub fn cycle_summary(&self) -> Vec<(Goal, PerformanceSnapshot)> {
        self.pool
            .goals()
            .iter()
            .map(|goal| (goal.clone(), goal.performance.clone().unwrap_or_default()))
            .collect()
    }

    /// Proposals for `goals`, using the performance attached to each.
    pub fn propose_next_cycle(&self, goals: &[Goal]) -> Vec<ProposedGoal> {
        self.advisor.suggest_all(goals)
    }

    /// Proposals for every goal of the loaded cycle.
    pub fn propose_for_loaded_cycle(&self) -> Vec<ProposedGoal> {
        self.propose_next_cycle(self.pool.goals())
    }

    /// Create the next cycle from the included proposals.
    ///
    /// The new cycle number is one past the highest cycle the user has or is
    /// viewing. Returns the created goals; nothing is written when no proposal
    /// is included.
    pub async fn commit_next_cycle(
        &mut self,
        proposals: Vec<ProposedGoal>,
    ) -> Result<Vec<Goal>, SessionError> {
        self.ensure_ready()?;
        let user_id = self.user_id()?;

        let accepted: Vec<ProposedGoal> = proposals.into_iter().filter(|p| p.include).collect();
        if accepted.is_empty() {
            self.notifier
                .notify(Notification::info("No exercises selected for the next cycle"));
            return Ok(Vec::new());
        }

        let previous = self.begin(SessionPhase::Refreshing);

        let listed = self.goal_store.list_cycles_for_user(user_id).await;
        let known = match listed {
            Ok(cycles) => cycles.into_iter().max().unwrap_or(0),
            Err(e) => return Err(self.fail(previous, "create next cycle", e)),
        };
        let next_cycle = known.max(self.cycle.unwrap_or(0)) + 1;

        let inserted = self
            .goal_store
            .bulk_insert_goals(user_id, next_cycle, &accepted)
            .await;
        let created = match inserted {
            Ok(goals) => goals,
            Err(e) => return Err(self.fail(previous, "create next cycle", e)),
        };

        tracing::info!("Created cycle {} with {} goals", next_cycle, created.len());
        self.notifier.notify(Notification::success(format!(
            "Created {} goals for cycle {}",
            created.len(),
            next_cycle
        )));
        self.finish(previous);
        Ok(created)
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// End the session: stop both timers and reject every later command.
    pub fn teardown(&mut self) {
        if self.phase == SessionPhase::TornDown {
            return;
        }
        self.clock.stop();
        self.phase = SessionPhase::TornDown;
        tracing::info!("Session torn down");
        self.emit(SessionEvent::TornDown);
    }

    /// Apply one command. Replies to query commands go out on their channel.
    pub async fn handle(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        match command {
            SessionCommand::SelectCycle(cycle) => self.select_cycle(cycle).await,
            SessionCommand::LoadLatestCycle => self.load_latest_cycle().await.map(|_| ()),
            SessionCommand::SetFilters {
                categories,
                equipment,
            } => self.set_filters(categories, equipment),
            SessionCommand::SkipGoal => self.skip_goal().map(|_| ()),
            SessionCommand::LogSet(set) => self.log_set(set).await.map(|_| ()),
            SessionCommand::PauseGoal => self.pause_goal().await,
            SessionCommand::ChangeGoal(goal) => self.change_goal(goal),
            SessionCommand::StartTimer(kind) => self.start_timer(kind).map(|_| ()),
            SessionCommand::PauseTimer(kind) => self.pause_timer(kind).map(|_| ()),
            SessionCommand::ResetTimer { kind, seconds } => self.reset_timer(kind, seconds),
            SessionCommand::CommitNextCycle(proposals) => {
                self.commit_next_cycle(proposals).await.map(|_| ())
            }
            SessionCommand::TimerRemaining { kind, reply } => {
                let _ = reply.send(self.timer_remaining(kind));
                Ok(())
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
                Ok(())
            }
            SessionCommand::ProposeNextCycle { reply } => {
                let _ = reply.send(self.propose_for_loaded_cycle());
                Ok(())
            }
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn ensure_alive(&self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::TornDown {
            return Err(SessionError::TornDown);
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        self.ensure_alive()?;
        if self.phase.is_busy() {
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn user_id(&self) -> Result<Uuid, SessionError> {
        self.identity.current_user_id().ok_or_else(|| {
            self.notifier
                .notify(Notification::error("Sign in to start a session"));
            SessionError::NoUser
        })
    }

    fn begin(&mut self, phase: SessionPhase) -> SessionPhase {
        let previous = std::mem::replace(&mut self.phase, phase);
        self.emit(SessionEvent::BusyChanged(true));
        previous
    }

    fn finish(&mut self, previous: SessionPhase) {
        self.phase = previous;
        self.emit(SessionEvent::BusyChanged(false));
    }

    fn fail(&mut self, previous: SessionPhase, action: &str, error: StoreError) -> SessionError {
        tracing::warn!("Could not {}: {}", action, error);
        self.finish(previous);
        self.notifier
            .notify(Notification::error(format!("Could not {}: {}", action, error)));
        SessionError::Store(error)
    }

    /// Keep the current goal if it is still a candidate, otherwise pick one.
    fn reconcile(&mut self) {
        if let Some(id) = self.current.as_ref().map(|g| g.id) {
            if self.pool.is_candidate(id) {
                self.current = self.pool.get(id).cloned();
                self.phase = SessionPhase::Active;
                return;
            }
        }

        let candidates = self.pool.filtered_candidates();
        let next = self.selector.select_next(&candidates, None).cloned();
        self.set_current(next);
    }

    fn set_current(&mut self, goal: Option<Goal>) {
        let duration = goal
            .as_ref()
            .and_then(|g| g.target_duration_seconds)
            .unwrap_or(0);
        self.clock.with(TimerKind::Exercise, |timer| timer.reset(duration));

        match &goal {
            Some(goal) => {
                tracing::debug!("Current goal: {}", goal);
                self.phase = SessionPhase::Active;
                self.emit(SessionEvent::GoalChanged {
                    goal_id: goal.id,
                    exercise_name: goal.exercise_name.clone(),
                });
            }
            None => {
                tracing::debug!("No candidate goals");
                self.phase = SessionPhase::NoGoal;
                self.emit(SessionEvent::NoGoal);
                self.notifier
                    .notify(Notification::info("Nothing to do: no exercises match"));
            }
        }

        self.current = goal;
    }
}

/// Attach each goal's snapshot computed from `entries`.
fn attach_performance(goals: Vec<Goal>, entries: &[DoneExerciseLogEntry]) -> Vec<Goal> {
    goals
        .into_iter()
        .map(|mut goal| {
            goal.performance = Some(aggregate(&goal, entries));
            goal
        })
        .collect()
}
