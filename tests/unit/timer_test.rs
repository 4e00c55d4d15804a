//! Unit tests for the countdown timer.

use repcycle::timer::{CountdownTimer, TimerEvent, TimerPhase};

#[test]
fn test_thirty_second_countdown() {
    let mut timer = CountdownTimer::default();
    timer.reset(30);
    assert!(timer.start());

    let events: Vec<TimerEvent> = (0..30).filter_map(|_| timer.tick()).collect();

    assert_eq!(timer.phase(), TimerPhase::Completed);
    assert_eq!(timer.get_remaining(), 0);
    assert_eq!(
        events.iter().filter(|e| **e == TimerEvent::Completed).count(),
        1
    );
    assert_eq!(events.last(), Some(&TimerEvent::Completed));
    assert_eq!(events[0], TimerEvent::Ticked { remaining: 29 });
}

#[test]
fn test_no_ticks_after_completion() {
    let mut timer = CountdownTimer::new(2);
    timer.start();
    timer.tick();
    timer.tick();

    assert!(timer.tick().is_none());
    assert!(!timer.start());
    assert_eq!(timer.get_remaining(), 0);
}

#[test]
fn test_pause_resume_keeps_remaining() {
    let mut timer = CountdownTimer::new(10);
    timer.start();
    for _ in 0..4 {
        timer.tick();
    }

    assert_eq!(timer.pause(), Some(6));
    assert!(timer.tick().is_none());
    assert_eq!(timer.get_remaining(), 6);

    assert!(timer.start());
    assert_eq!(timer.tick(), Some(TimerEvent::Ticked { remaining: 5 }));
}

#[test]
fn test_reset_from_any_phase() {
    let mut timer = CountdownTimer::new(5);
    timer.start();
    timer.tick();

    timer.reset(20);
    assert_eq!(timer.phase(), TimerPhase::Idle);
    assert_eq!(timer.get_remaining(), 20);
    assert!(timer.tick().is_none());

    timer.reset(0);
    assert_eq!(timer.phase(), TimerPhase::Completed);
    assert!(!timer.start());
}

#[test]
fn test_state_snapshot() {
    let mut timer = CountdownTimer::new(3);
    assert!(!timer.state().running);

    timer.start();
    let state = timer.state();
    assert_eq!(state.remaining_seconds, 3);
    assert!(state.running);
    assert!(!state.completed);

    for _ in 0..3 {
        timer.tick();
    }
    let state = timer.state();
    assert!(state.completed);
    assert!(!state.running);
}
