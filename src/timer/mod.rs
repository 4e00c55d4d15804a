//! Session countdown timers.

pub mod countdown;

pub use countdown::{CountdownTimer, TimerEvent, TimerKind, TimerPhase, TimerState};
