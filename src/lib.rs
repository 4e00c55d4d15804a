//! RepCycle - Workout Session Engine
//!
//! Picks the next planned exercise of a training cycle, runs the exercise and
//! rest countdowns, records completed sets, keeps per-goal performance up to
//! date and proposes adjusted targets for the next cycle.

pub mod alerts;
pub mod goals;
pub mod metrics;
pub mod progression;
pub mod recording;
pub mod session;
pub mod storage;
pub mod timer;

// Re-export commonly used types
pub use goals::types::{Goal, ProposedGoal};
pub use metrics::performance::PerformanceSnapshot;
pub use progression::advisor::ProgressionAdvisor;
pub use session::controller::SessionController;
pub use session::runner::{SessionHandle, SessionRunner};
pub use storage::config::AppConfig;
pub use storage::database::Database;
pub use timer::countdown::CountdownTimer;
