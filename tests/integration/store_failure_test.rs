//! Integration tests for store failures during a session.
//!
//! A failed round-trip must leave the session as it was, report an error
//! notification and let the user retry.

use repcycle::alerts::{NotificationLevel, RecordingNotifier};
use repcycle::goals::ProposedGoal;
use repcycle::recording::{DoneExerciseLogEntry, NewLogEntry, SetData};
use repcycle::session::{SessionController, SessionError, SessionPhase};
use repcycle::storage::{Database, GoalStore, LogStore, StaticIdentity, StoreError};
use repcycle::timer::TimerKind;
use repcycle::Goal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Log store that rejects a fixed number of calls before delegating.
struct OutageLog {
    db: Arc<Database>,
    failures_left: AtomicUsize,
}

impl OutageLog {
    fn new(db: Arc<Database>, failures: usize) -> Self {
        Self {
            db,
            failures_left: AtomicUsize::new(failures),
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("backend timeout".to_string()));
        }
        Ok(())
    }
}

impl LogStore for OutageLog {
    async fn append_entry(&self, entry: NewLogEntry) -> Result<DoneExerciseLogEntry, StoreError> {
        self.check()?;
        self.db.append_entry(entry).await
    }

    async fn list_entries_for_cycle(
        &self,
        user_id: Uuid,
        cycle: u32,
    ) -> Result<Vec<DoneExerciseLogEntry>, StoreError> {
        self.db.list_entries_for_cycle(user_id, cycle).await
    }
}

/// Log store whose cycle reads can be made to fail.
struct FlakyReads {
    db: Arc<Database>,
    failures_left: AtomicUsize,
}

impl FlakyReads {
    fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            failures_left: AtomicUsize::new(0),
        }
    }

    fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }
}

impl LogStore for FlakyReads {
    async fn append_entry(&self, entry: NewLogEntry) -> Result<DoneExerciseLogEntry, StoreError> {
        self.db.append_entry(entry).await
    }

    async fn list_entries_for_cycle(
        &self,
        user_id: Uuid,
        cycle: u32,
    ) -> Result<Vec<DoneExerciseLogEntry>, StoreError> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("read replica lagging".to_string()));
        }
        self.db.list_entries_for_cycle(user_id, cycle).await
    }
}

/// Goal store that is always down.
struct DownGoals;

impl GoalStore for DownGoals {
    async fn list_active_goals(
        &self,
        _user_id: Uuid,
        _cycle: u32,
    ) -> Result<Vec<Goal>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    async fn set_goal_active(&self, _goal_id: Uuid, _active: bool) -> Result<Goal, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    async fn bulk_insert_goals(
        &self,
        _user_id: Uuid,
        _cycle: u32,
        _proposals: &[ProposedGoal],
    ) -> Result<Vec<Goal>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    async fn list_cycles_for_user(&self, _user_id: Uuid) -> Result<Vec<u32>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }
}

fn seeded(user_id: Uuid) -> (Arc<Database>, Goal) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let goal = Goal::new(user_id, 1, "Kettlebell Swing", 4).with_reps(15);
    db.insert_goal(&goal).unwrap();
    (db, goal)
}

#[tokio::test]
async fn test_log_failure_then_retry() {
    let user_id = Uuid::new_v4();
    let (db, goal) = seeded(user_id);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = SessionController::new(
        db.clone(),
        OutageLog::new(db.clone(), 1),
        StaticIdentity::user(user_id),
        notifier.clone(),
    );
    session.select_cycle(1).await.unwrap();

    let result = session.log_set(SetData::reps(15)).await;
    assert!(matches!(
        result,
        Err(SessionError::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(session.phase(), SessionPhase::Active);
    assert!(!session.is_busy());
    assert_eq!(session.current_goal().map(|g| g.id), Some(goal.id));
    assert!(!session.timer_state(TimerKind::Rest).running);
    assert_eq!(db.count_log_entries(goal.id).unwrap(), 0);

    let errors = notifier.messages(NotificationLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("backend timeout"));

    session.log_set(SetData::reps(15)).await.unwrap();
    assert_eq!(db.count_log_entries(goal.id).unwrap(), 1);
    assert!(session.timer_state(TimerKind::Rest).running);
}

#[tokio::test]
async fn test_goal_store_down() {
    let user_id = Uuid::new_v4();
    let (db, _) = seeded(user_id);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = SessionController::new(
        DownGoals,
        db,
        StaticIdentity::user(user_id),
        notifier.clone(),
    );

    assert!(session.load_latest_cycle().await.is_err());
    assert!(session.select_cycle(1).await.is_err());

    assert_eq!(session.phase(), SessionPhase::NoGoal);
    assert_eq!(session.cycle(), None);
    assert!(session.pool().is_empty());
    assert_eq!(notifier.messages(NotificationLevel::Error).len(), 2);
}

#[tokio::test]
async fn test_commit_failure_writes_nothing() {
    let user_id = Uuid::new_v4();
    let (db, goal) = seeded(user_id);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = SessionController::new(
        DownGoals,
        db.clone(),
        StaticIdentity::user(user_id),
        notifier.clone(),
    );

    let proposals = session.propose_next_cycle(&[goal]);
    let result = session.commit_next_cycle(proposals).await;

    assert!(matches!(result, Err(SessionError::Store(_))));
    assert_eq!(db.cycles_for_user(user_id).unwrap(), vec![1]);
    assert_eq!(session.phase(), SessionPhase::NoGoal);
    assert_eq!(notifier.messages(NotificationLevel::Error).len(), 1);
}

#[tokio::test]
async fn test_refresh_failure_keeps_stored_set() {
    let user_id = Uuid::new_v4();
    let (db, goal) = seeded(user_id);
    let log = Arc::new(FlakyReads::new(db.clone()));
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = SessionController::new(
        db.clone(),
        log.clone(),
        StaticIdentity::user(user_id),
        notifier.clone(),
    );
    session.select_cycle(1).await.unwrap();
    session.log_set(SetData::reps(15)).await.unwrap();

    log.fail_next(1);
    let entry = session.log_set(SetData::reps(14).with_rest(30)).await.unwrap();

    // Stored once, counted once, and the session moved on as usual
    assert_eq!(entry.goal_id, goal.id);
    assert_eq!(db.count_log_entries(goal.id).unwrap(), 2);
    let performance = session
        .pool()
        .get(goal.id)
        .and_then(|g| g.performance.clone())
        .unwrap();
    assert_eq!(performance.total_sets, 2);
    assert_eq!(performance.total_reps, 29);
    assert_eq!(session.phase(), SessionPhase::Active);
    assert_eq!(session.timer_remaining(TimerKind::Rest), 30);
    assert!(session.timer_state(TimerKind::Rest).running);

    let errors = notifier.messages(NotificationLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("read replica lagging"));

    // The next set refreshes from the store again
    session.log_set(SetData::reps(15)).await.unwrap();
    assert_eq!(db.count_log_entries(goal.id).unwrap(), 3);
    let performance = session
        .pool()
        .get(goal.id)
        .and_then(|g| g.performance.clone())
        .unwrap();
    assert_eq!(performance.total_sets, 3);
}
