//! Unit tests for next-exercise selection.

use repcycle::goals::{ExerciseSelector, Goal};
use std::collections::HashSet;
use uuid::Uuid;

fn goals(count: usize) -> Vec<Goal> {
    let user_id = Uuid::new_v4();
    (0..count)
        .map(|i| Goal::new(user_id, 1, format!("Exercise {}", i), 3).with_reps(10))
        .collect()
}

#[test]
fn test_empty_candidates() {
    let mut selector = ExerciseSelector::with_seed(1);
    assert!(selector.select_next(&[], None).is_none());
    assert!(selector.select_next(&[], Some(Uuid::new_v4())).is_none());
}

#[test]
fn test_excluded_goal_never_returned() {
    let candidates = goals(4);
    let mut selector = ExerciseSelector::with_seed(42);

    for goal in &candidates {
        for _ in 0..50 {
            let next = selector.select_next(&candidates, Some(goal.id)).unwrap();
            assert_ne!(next.id, goal.id);
        }
    }
}

#[test]
fn test_only_candidate_is_returned_even_if_excluded() {
    let candidates = goals(1);
    let mut selector = ExerciseSelector::with_seed(3);

    let next = selector
        .select_next(&candidates, Some(candidates[0].id))
        .unwrap();
    assert_eq!(next.id, candidates[0].id);
}

#[test]
fn test_selection_covers_all_candidates() {
    let candidates = goals(5);
    let mut selector = ExerciseSelector::with_seed(9);

    let seen: HashSet<Uuid> = (0..500)
        .filter_map(|_| selector.select_next(&candidates, None))
        .map(|g| g.id)
        .collect();

    assert_eq!(seen.len(), candidates.len());
}

#[test]
fn test_same_seed_same_sequence() {
    let candidates = goals(6);
    let mut a = ExerciseSelector::with_seed(77);
    let mut b = ExerciseSelector::with_seed(77);

    for _ in 0..20 {
        assert_eq!(
            a.select_next(&candidates, None).map(|g| g.id),
            b.select_next(&candidates, None).map(|g| g.id)
        );
    }
}
