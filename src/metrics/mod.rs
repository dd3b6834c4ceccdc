//! Metrics sampling, concurrent collection and aggregation.
//!
//! A [`Sampler`] takes one snapshot, a [`Collector`] runs many samplers in
//! parallel and gathers their outcomes, and [`aggregate`] reduces those
//! outcomes to a single average snapshot.

pub mod aggregator;
pub mod collector;
pub mod data;
pub mod sampler;

// Re-export commonly used items
pub use aggregator::{aggregate, aggregate_at};
pub use collector::{Collector, CollectorConfig, FailurePolicy};
pub use data::{AggregateSnapshot, Outcome, ResultSet, Snapshot, TaskResult};
pub use sampler::{Sampler, SimulatedSampler, SystemSampler};
