//! Integration tests for the SQLite goal and log store.

use repcycle::goals::ProposedGoal;
use repcycle::recording::NewLogEntry;
use repcycle::storage::{Database, GoalStore, LogStore, StoreError};
use repcycle::Goal;
use tempfile::TempDir;
use uuid::Uuid;

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("repcycle.db");
    let user_id = Uuid::new_v4();
    let goal = Goal::new(user_id, 3, "Goblet Squat", 4)
        .with_reps(12)
        .with_weight(24.0)
        .with_categories(["legs", "core"])
        .with_equipment(["kettlebell"]);

    {
        let db = Database::open(&path).unwrap();
        db.insert_goal(&goal).unwrap();
        let mut entry = NewLogEntry::for_goal(&goal, 12);
        entry.weight = Some(24.0);
        db.append_entry(entry).await.unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.schema_version().unwrap(), 1);

    let goals = db.list_active_goals(user_id, 3).await.unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].exercise_name, "Goblet Squat");
    assert_eq!(goals[0].target_weight, Some(24.0));
    assert_eq!(goals[0].categories, goal.categories);
    assert_eq!(goals[0].equipment, goal.equipment);
    assert!(goals[0].performance.is_none());

    let entries = db.list_entries_for_cycle(user_id, 3).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].reps, 12);
    assert_eq!(entries[0].weight, Some(24.0));
}

#[tokio::test]
async fn test_inactive_goals_not_listed() {
    let db = Database::open_in_memory().unwrap();
    let user_id = Uuid::new_v4();
    let keep = Goal::new(user_id, 1, "Dips", 3).with_reps(10);
    let pause = Goal::new(user_id, 1, "Flyes", 3).with_reps(12);
    db.insert_goal(&keep).unwrap();
    db.insert_goal(&pause).unwrap();

    let updated = db.set_goal_active(pause.id, false).await.unwrap();
    assert!(!updated.active);

    let goals = db.list_active_goals(user_id, 1).await.unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].id, keep.id);

    // Paused goals still count towards the user's cycles
    assert_eq!(db.list_cycles_for_user(user_id).await.unwrap(), vec![1]);
}

#[tokio::test]
async fn test_unknown_goal_is_reported() {
    let db = Database::open_in_memory().unwrap();
    let missing = Uuid::new_v4();

    let result = db.set_goal_active(missing, false).await;
    assert!(matches!(result, Err(StoreError::GoalNotFound(id)) if id == missing));
}

#[tokio::test]
async fn test_bulk_insert_creates_fresh_goals() {
    let db = Database::open_in_memory().unwrap();
    let user_id = Uuid::new_v4();
    let source = Goal::new(user_id, 1, "Deadlift", 3)
        .with_reps(5)
        .with_weight(120.0);
    db.insert_goal(&source).unwrap();

    let mut proposal = ProposedGoal::from_goal(&source, None);
    proposal.target_reps = Some(6);

    let created = db
        .bulk_insert_goals(user_id, 2, &[proposal])
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_ne!(created[0].id, source.id);
    assert_eq!(created[0].cycle, 2);
    assert_eq!(created[0].target_reps, Some(6));
    assert!(created[0].active);

    assert_eq!(db.list_cycles_for_user(user_id).await.unwrap(), vec![1, 2]);
    let next = db.list_active_goals(user_id, 2).await.unwrap();
    assert_eq!(next[0].target_weight, Some(120.0));
}

#[tokio::test]
async fn test_entries_scoped_by_user_and_cycle() {
    let db = Database::open_in_memory().unwrap();
    let user_id = Uuid::new_v4();
    let goal = Goal::new(user_id, 1, "Row", 3).with_reps(10);
    let later = Goal::new(user_id, 2, "Row", 3).with_reps(11);
    let stranger = Goal::new(Uuid::new_v4(), 1, "Row", 3).with_reps(10);

    for g in [&goal, &later, &stranger] {
        db.insert_goal(g).unwrap();
        db.append_entry(NewLogEntry::for_goal(g, 10)).await.unwrap();
    }

    let entries = db.list_entries_for_cycle(user_id, 1).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].goal_id, goal.id);
}
