//! Storage module for goal/log persistence and configuration.

pub mod config;
pub mod database;
pub mod schema;
pub mod traits;

pub use config::{AppConfig, ConfigError, SessionSettings, UserSettings};
pub use database::{Database, DatabaseError};
pub use traits::{GoalStore, IdentityContext, LogStore, StaticIdentity, StoreError};
