//! Recording module for completed sets.

pub mod types;

pub use types::{DoneExerciseLogEntry, NewLogEntry, SetData, ValidationError};
