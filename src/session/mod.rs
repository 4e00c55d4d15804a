//! Workout session module.
//!
//! Provides the session engine:
//! - Phases, events, commands and errors
//! - The controller owning the current goal
//! - A shared clock for the exercise and rest timers
//! - A single-task runner with command and teardown channels

pub mod clock;
pub mod controller;
pub mod runner;
pub mod types;

pub use clock::SessionClock;
pub use controller::SessionController;
pub use runner::{SessionHandle, SessionRunner};
pub use types::{SessionCommand, SessionError, SessionEvent, SessionPhase, SessionSnapshot};
