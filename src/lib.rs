//! # Concurrent Monitor
//!
//! Collects resource-usage snapshots (CPU, memory, disk, network, process
//! count) from many concurrent sampling tasks, reduces them to an average,
//! and serves both raw and aggregate snapshots over HTTP.
//!
//! ## Features
//!
//! - **Pluggable sampling**: real host metrics via sysinfo, or a seeded simulator
//! - **Fan-out/fan-in collection**: N tasks, bounded channel, join-then-close
//! - **Failure tolerance**: a failed sample is an outcome, never an aborted batch
//! - **HTTP API**: `/metrics` and `/concurrent-metrics` served with axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use concurrent_monitor::{aggregate, Collector, SystemSampler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let collector = Collector::new(Arc::new(SystemSampler::new()));
//!     let results = collector.collect(10).await?;
//!     let average = aggregate(&results);
//!
//!     println!("{} results, cpu {:.1}%", results.len(), average.cpu_usage);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod metrics;
pub mod web;

// Re-export public API
pub use error::{MonitorError, Result};
pub use metrics::{
    aggregator::{aggregate, aggregate_at},
    collector::{Collector, CollectorConfig, FailurePolicy},
    data::{AggregateSnapshot, Outcome, ResultSet, Snapshot, TaskResult},
    sampler::{Sampler, SimulatedSampler, SystemSampler},
};

pub use web::{start_web_server, AppState, WebConfig};

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8080;

/// Concurrency used when a request does not specify a usable one
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Upper bound on the number of tasks in one collection run
pub const MAX_CONCURRENCY: usize = 1000;
