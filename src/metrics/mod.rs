//! Metrics module for training performance calculations.

pub mod performance;

pub use performance::{aggregate, compliance, round1, PerformanceSnapshot};
