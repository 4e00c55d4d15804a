//! Countdown timer state machine.
//!
//! One machine backs both session timers: the exercise timer counting down a
//! timed set and the rest timer counting down the break between sets. The
//! timer never owns a clock; whoever drives it calls [`CountdownTimer::tick`]
//! once per second.

use serde::{Deserialize, Serialize};

/// Which of the two session timers an event or command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Counts down a timed exercise set
    Exercise,
    /// Counts down rest between sets
    Rest,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerKind::Exercise => write!(f, "Exercise"),
            TimerKind::Rest => write!(f, "Rest"),
        }
    }
}

/// Lifecycle phase of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerPhase {
    /// Armed with a duration, not yet started
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Stopped mid-countdown, remaining time preserved
    Paused,
    /// Reached zero
    Completed,
}

/// Externally visible timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerState {
    /// Seconds left on the countdown
    pub remaining_seconds: u32,
    /// Whether the countdown is ticking
    pub running: bool,
    /// Whether the countdown reached zero
    pub completed: bool,
}

/// Event produced by a tick of a running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second elapsed, countdown still running
    Ticked { remaining: u32 },
    /// Countdown reached zero; the completion tone should play
    Completed,
}

/// A restartable countdown measured in whole seconds.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    phase: TimerPhase,
    remaining: u32,
}

impl CountdownTimer {
    /// Create a timer armed with `initial_seconds`.
    ///
    /// A zero duration yields a timer that is already completed.
    pub fn new(initial_seconds: u32) -> Self {
        Self {
            phase: Self::armed_phase(initial_seconds),
            remaining: initial_seconds,
        }
    }

    fn armed_phase(seconds: u32) -> TimerPhase {
        if seconds > 0 {
            TimerPhase::Idle
        } else {
            TimerPhase::Completed
        }
    }

    /// Start or resume the countdown.
    ///
    /// Only an idle or paused timer with time left can start; anything else
    /// is silently ignored. Returns whether the timer is now running.
    pub fn start(&mut self) -> bool {
        match self.phase {
            TimerPhase::Idle | TimerPhase::Paused if self.remaining > 0 => {
                self.phase = TimerPhase::Running;
                true
            }
            TimerPhase::Running => true,
            _ => false,
        }
    }

    /// Pause a running countdown, returning the captured remaining seconds.
    ///
    /// Returns `None` when the timer was not running.
    pub fn pause(&mut self) -> Option<u32> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        self.phase = TimerPhase::Paused;
        Some(self.remaining)
    }

    /// Re-arm the timer with a new duration, from any phase.
    pub fn reset(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.phase = Self::armed_phase(seconds);
    }

    /// Stop the countdown for good, keeping the remaining value readable.
    pub fn stop(&mut self) {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Paused;
        }
    }

    /// Advance one second.
    ///
    /// Returns `None` when the timer is not running.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.phase != TimerPhase::Running {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = TimerPhase::Completed;
            Some(TimerEvent::Completed)
        } else {
            Some(TimerEvent::Ticked {
                remaining: self.remaining,
            })
        }
    }

    /// Seconds left, without side effects.
    pub fn get_remaining(&self) -> u32 {
        self.remaining
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn is_completed(&self) -> bool {
        self.phase == TimerPhase::Completed
    }

    /// Snapshot of the timer for display.
    pub fn state(&self) -> TimerState {
        TimerState {
            remaining_seconds: self.remaining,
            running: self.is_running(),
            completed: self.is_completed(),
        }
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(0)
    }
}
