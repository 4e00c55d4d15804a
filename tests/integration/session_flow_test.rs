//! Integration tests for a full training cycle against an on-disk database.
//!
//! Covers loading a cycle, filtering, logging sets, pausing a goal and
//! rolling the cycle over into the next one.

use repcycle::alerts::{NotificationLevel, RecordingNotifier};
use repcycle::goals::{tag_set, ExerciseSelector};
use repcycle::progression::ProgressionKind;
use repcycle::recording::SetData;
use repcycle::session::{SessionController, SessionPhase};
use repcycle::storage::{Database, StaticIdentity};
use repcycle::timer::TimerKind;
use repcycle::Goal;
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

fn plan(user_id: Uuid) -> Vec<Goal> {
    vec![
        Goal::new(user_id, 1, "Bench Press", 3)
            .with_reps(8)
            .with_weight(60.0)
            .with_categories(["push"])
            .with_equipment(["barbell"]),
        Goal::new(user_id, 1, "Push-up", 3)
            .with_reps(10)
            .with_categories(["push", "core"])
            .with_equipment(["bodyweight"]),
        Goal::new(user_id, 1, "Plank", 2)
            .with_duration(30)
            .with_categories(["core"])
            .with_equipment(["bodyweight"]),
        Goal::new(user_id, 1, "Barbell Row", 3)
            .with_reps(8)
            .with_weight(50.0)
            .with_categories(["pull"])
            .with_equipment(["barbell"]),
    ]
}

#[tokio::test]
async fn test_full_cycle_flow() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("repcycle.db");
    let user_id = Uuid::new_v4();
    let goals = plan(user_id);

    let db = Arc::new(Database::open(&db_path).unwrap());
    for goal in &goals {
        db.insert_goal(goal).unwrap();
    }

    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = SessionController::new(
        db.clone(),
        db.clone(),
        StaticIdentity::user(user_id),
        notifier.clone(),
    )
    .with_selector(ExerciseSelector::with_seed(11));

    assert_eq!(session.load_latest_cycle().await.unwrap(), Some(1));
    assert_eq!(session.phase(), SessionPhase::Active);

    // Only push work today
    session
        .set_filters(tag_set(["push"]), BTreeSet::new())
        .unwrap();
    let current = session.current_goal().unwrap().exercise_name.clone();
    assert!(current == "Bench Press" || current == "Push-up");

    let bench = goals[0].clone();
    let pushup = goals[1].clone();

    // Three full bench sets and three strong push-up sets, alternating
    for _ in 0..3 {
        session.change_goal(bench.clone()).unwrap();
        session
            .log_set(SetData::reps(8).with_weight(60.0))
            .await
            .unwrap();
        // Two push candidates, so logging always moves to the other one
        assert_eq!(session.current_goal().map(|g| g.id), Some(pushup.id));

        session
            .log_set(SetData::reps(13).with_rest(60))
            .await
            .unwrap();
    }
    assert_eq!(session.timer_remaining(TimerKind::Rest), 60);
    assert_eq!(db.count_log_entries(bench.id).unwrap(), 3);
    assert_eq!(db.count_log_entries(pushup.id).unwrap(), 3);

    // The row is paused for good
    session
        .set_filters(BTreeSet::new(), BTreeSet::new())
        .unwrap();
    session.change_goal(goals[3].clone()).unwrap();
    session.pause_goal().await.unwrap();
    assert!(session.pool().get(goals[3].id).is_none());

    let summary = session.cycle_summary();
    assert_eq!(summary.len(), 3);
    let (_, bench_perf) = summary.iter().find(|(g, _)| g.id == bench.id).unwrap();
    assert_eq!(bench_perf.total_sets, 3);
    assert_eq!(bench_perf.total_volume, 1440.0);
    assert!(bench_perf.was_completed);

    let proposals = session.propose_for_loaded_cycle();
    let bench_next = proposals
        .iter()
        .find(|p| p.source_goal_id == bench.id)
        .unwrap();
    assert_eq!(bench_next.progression, ProgressionKind::AddReps);
    assert_eq!(bench_next.target_reps, Some(9));

    let pushup_next = proposals
        .iter()
        .find(|p| p.source_goal_id == pushup.id)
        .unwrap();
    // Averaging 13 reps is past the rep ceiling, so a set is added instead
    assert_eq!(pushup_next.progression, ProgressionKind::AddSet);
    assert_eq!(pushup_next.target_sets, 4);
    assert_eq!(pushup_next.target_reps, Some(10));

    let plank_next = proposals
        .iter()
        .find(|p| p.source_goal_id == goals[2].id)
        .unwrap();
    assert_eq!(plank_next.target_duration_seconds, Some(30));
    assert_eq!(plank_next.progression, ProgressionKind::RepeatBelowTarget);

    let created = session.commit_next_cycle(proposals).await.unwrap();
    assert_eq!(created.len(), 3);
    assert!(!notifier.messages(NotificationLevel::Success).is_empty());
    session.teardown();
    drop(session);
    drop(db);

    // A fresh session on the reopened database starts in the new cycle
    let db = Arc::new(Database::open(&db_path).unwrap());
    let mut session = SessionController::new(
        db.clone(),
        db.clone(),
        StaticIdentity::user(user_id),
        Arc::new(RecordingNotifier::new()),
    );

    assert_eq!(session.load_latest_cycle().await.unwrap(), Some(2));
    assert_eq!(session.pool().len(), 3);
    assert!(session
        .pool()
        .goals()
        .iter()
        .all(|g| g.performance.as_ref().map(|p| p.total_sets) == Some(0)));

    let names: BTreeSet<String> = session
        .pool()
        .goals()
        .iter()
        .map(|g| g.exercise_name.clone())
        .collect();
    assert!(!names.contains("Barbell Row"));
}

#[tokio::test]
async fn test_filters_leave_nothing_to_do() {
    let user_id = Uuid::new_v4();
    let db = Arc::new(Database::open_in_memory().unwrap());
    for goal in plan(user_id) {
        db.insert_goal(&goal).unwrap();
    }

    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = SessionController::new(
        db.clone(),
        db,
        StaticIdentity::user(user_id),
        notifier.clone(),
    );
    session.select_cycle(1).await.unwrap();

    session
        .set_filters(tag_set(["legs"]), BTreeSet::new())
        .unwrap();

    assert_eq!(session.phase(), SessionPhase::NoGoal);
    assert!(matches!(
        session.log_set(SetData::reps(5)).await,
        Err(repcycle::session::SessionError::NoCurrentGoal)
    ));
    assert_eq!(notifier.messages(NotificationLevel::Info).len(), 1);
}

#[tokio::test]
async fn test_other_users_are_invisible() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let owner = Uuid::new_v4();
    for goal in plan(owner) {
        db.insert_goal(&goal).unwrap();
    }

    let mut session = SessionController::new(
        db.clone(),
        db,
        StaticIdentity::user(Uuid::new_v4()),
        Arc::new(RecordingNotifier::new()),
    );

    assert_eq!(session.load_latest_cycle().await.unwrap(), None);
    session.select_cycle(1).await.unwrap();
    assert!(session.pool().is_empty());
    assert_eq!(session.phase(), SessionPhase::NoGoal);
}
