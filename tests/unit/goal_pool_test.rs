//! Unit tests for goal pool filtering.

use repcycle::goals::{tag_set, Goal, GoalPool};
use std::collections::BTreeSet;
use uuid::Uuid;

fn pool() -> GoalPool {
    let user_id = Uuid::new_v4();
    let mut pool = GoalPool::new();
    pool.set_goals(vec![
        Goal::new(user_id, 1, "Bench Press", 3)
            .with_reps(8)
            .with_categories(["push", "chest"])
            .with_equipment(["barbell"]),
        Goal::new(user_id, 1, "Dips", 3)
            .with_reps(10)
            .with_categories(["push"])
            .with_equipment(["bodyweight"]),
        Goal::new(user_id, 1, "Plank", 3)
            .with_duration(60)
            .with_categories(["core"])
            .with_equipment(["bodyweight"]),
        Goal::new(user_id, 1, "Row", 3)
            .with_reps(10)
            .with_categories(["pull"])
            .with_equipment(["dumbbell"]),
    ]);
    pool
}

fn names(goals: &[Goal]) -> Vec<&str> {
    let mut names: Vec<&str> = goals.iter().map(|g| g.exercise_name.as_str()).collect();
    names.sort();
    names
}

#[test]
fn test_empty_filters_pass_everything() {
    let pool = pool();
    assert_eq!(pool.filtered_candidates().len(), 4);
}

#[test]
fn test_categories_union() {
    let mut pool = pool();
    pool.set_filters(tag_set(["push", "core"]), BTreeSet::new());

    let candidates = pool.filtered_candidates();
    assert_eq!(names(&candidates), vec!["Bench Press", "Dips", "Plank"]);
}

#[test]
fn test_dimensions_intersect() {
    let mut pool = pool();
    pool.set_filters(tag_set(["push", "core"]), tag_set(["bodyweight"]));

    let candidates = pool.filtered_candidates();
    assert_eq!(names(&candidates), vec!["Dips", "Plank"]);
}

#[test]
fn test_no_match_is_empty() {
    let mut pool = pool();
    pool.set_filters(tag_set(["legs"]), BTreeSet::new());
    assert!(pool.filtered_candidates().is_empty());
}

#[test]
fn test_inactive_goals_excluded() {
    let mut pool = pool();
    let mut goals = pool.goals().to_vec();
    goals[0].active = false;
    let inactive = goals[0].id;
    pool.set_goals(goals);

    assert!(!pool.is_candidate(inactive));
    assert_eq!(pool.filtered_candidates().len(), 3);
}

#[test]
fn test_removed_goal_leaves_pool() {
    let mut pool = pool();
    let id = pool.goals()[2].id;

    assert!(pool.remove(id).is_some());
    assert!(pool.get(id).is_none());
    assert_eq!(pool.len(), 3);
    assert!(pool.remove(id).is_none());
}
