//! Concurrent fan-out/fan-in sample collection.
//!
//! One collection run spawns a task per slot, funnels every task's outcome
//! through a bounded channel sized to the slot count, and closes the channel
//! from a single closer task once all slots have signalled completion.

use crate::error::{MonitorError, Result};
use crate::metrics::{
    data::{Outcome, ResultSet, TaskResult},
    sampler::Sampler,
};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Message recorded for slots failed by the failure policy.
pub const SIMULATED_FAILURE: &str = "Simulated collection error";

/// Message recorded for slots whose task ended without reporting.
const UNREPORTED_FAILURE: &str = "Sampling task terminated without reporting";

/// Decides, from a slot index alone, whether that slot fails on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Every slot samples.
    Never,
    /// Slots whose index is divisible by `n` fail. `EveryNth(0)` never fails.
    EveryNth(usize),
}

impl FailurePolicy {
    pub fn should_fail(&self, slot: usize) -> bool {
        match *self {
            FailurePolicy::Never => false,
            FailurePolicy::EveryNth(0) => false,
            FailurePolicy::EveryNth(n) => slot % n == 0,
        }
    }

    /// Number of slots in `0..concurrency` this policy fails.
    pub fn expected_failures(&self, concurrency: usize) -> usize {
        (0..concurrency).filter(|&slot| self.should_fail(slot)).count()
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::EveryNth(10)
    }
}

/// Configuration for a [`Collector`].
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Largest concurrency a single run accepts
    pub max_concurrency: usize,
    /// Failure injection applied to each slot
    pub failure_policy: FailurePolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: crate::MAX_CONCURRENCY,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl CollectorConfig {
    /// Set the largest accepted concurrency.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Set the failure injection policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// Runs batches of concurrent sampling tasks against a shared sampler.
#[derive(Clone)]
pub struct Collector {
    sampler: Arc<dyn Sampler>,
    config: CollectorConfig,
}

impl Collector {
    /// Create a collector with the default configuration.
    pub fn new(sampler: Arc<dyn Sampler>) -> Self {
        Self::with_config(sampler, CollectorConfig::default())
    }

    pub fn with_config(sampler: Arc<dyn Sampler>, config: CollectorConfig) -> Self {
        Self { sampler, config }
    }

    pub fn sampler(&self) -> &Arc<dyn Sampler> {
        &self.sampler
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Sample `concurrency` times in parallel and return every outcome.
    ///
    /// On success the result set holds exactly `concurrency` entries, one per
    /// slot. Failed samples are entries, not errors; the only error is a
    /// concurrency outside `1..=max_concurrency`.
    pub async fn collect(&self, concurrency: usize) -> Result<ResultSet> {
        let max = self.config.max_concurrency;
        if concurrency == 0 || concurrency > max {
            return Err(MonitorError::invalid_concurrency(concurrency, max));
        }

        let run_id = Uuid::new_v4();
        let span = info_span!("collect", %run_id, concurrency, sampler = self.sampler.name());
        self.run(run_id, concurrency).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, concurrency: usize) -> Result<ResultSet> {
        let (tx, rx) = mpsc::channel::<TaskResult>(concurrency);
        let mut units = JoinSet::new();

        for slot in 0..concurrency {
            let tx = tx.clone();
            let sampler = Arc::clone(&self.sampler);
            let inject_failure = self.config.failure_policy.should_fail(slot);

            units.spawn(async move {
                let outcome = sample_slot(slot, inject_failure, sampler).await;
                // Capacity equals the slot count, so this send never waits.
                tx.send(TaskResult::new(slot, outcome)).await.ok().map(|_| slot)
            });
        }

        // The closer holds the last sender; the channel closes when it exits.
        let closer = tokio::spawn(
            async move {
                let mut reported = vec![false; concurrency];
                while let Some(joined) = units.join_next().await {
                    match joined {
                        Ok(Some(slot)) => reported[slot] = true,
                        Ok(None) => debug!("Result receiver dropped before delivery"),
                        Err(e) => warn!("Sampling task ended abnormally: {}", e),
                    }
                }

                for (slot, _) in reported.iter().enumerate().filter(|(_, done)| !**done) {
                    let result = TaskResult::new(slot, Outcome::Err(UNREPORTED_FAILURE.to_string()));
                    if tx.send(result).await.is_err() {
                        break;
                    }
                }
            }
            .in_current_span(),
        );

        let results: Vec<TaskResult> = ReceiverStream::new(rx).collect().await;

        closer
            .await
            .map_err(|e| MonitorError::collection_error(format!("closer task failed: {}", e)))?;

        if results.len() != concurrency {
            return Err(MonitorError::collection_error(format!(
                "expected {} results, received {}",
                concurrency,
                results.len()
            )));
        }

        let set = ResultSet::with_run_id(run_id, results);
        info!(
            successes = set.success_count(),
            errors = set.error_count(),
            "Collection run complete"
        );
        Ok(set)
    }
}

/// Produce the outcome for one slot. Never panics and never returns early
/// without an outcome.
async fn sample_slot(slot: usize, inject_failure: bool, sampler: Arc<dyn Sampler>) -> Outcome {
    if inject_failure {
        debug!(slot, "Injected sampling failure");
        return Outcome::Err(SIMULATED_FAILURE.to_string());
    }

    match task::spawn_blocking(move || sampler.sample()).await {
        Ok(snapshot) => {
            debug!(slot, "Sample collected");
            Outcome::Ok(snapshot)
        }
        Err(e) if e.is_panic() => {
            let message = panic_message(e.into_panic());
            warn!(slot, "Sampler panicked: {}", message);
            Outcome::Err(format!("Sampler panicked: {}", message))
        }
        Err(e) => Outcome::Err(format!("Sampling task failed: {}", e)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::sampler::SimulatedSampler;

    fn collector() -> Collector {
        Collector::new(Arc::new(SimulatedSampler::new(1)))
    }

    #[test]
    fn test_failure_policy() {
        let policy = FailurePolicy::default();
        assert!(policy.should_fail(0));
        assert!(!policy.should_fail(1));
        assert!(policy.should_fail(10));
        assert!(policy.should_fail(20));
        assert_eq!(policy.expected_failures(1), 1);
        assert_eq!(policy.expected_failures(10), 1);
        assert_eq!(policy.expected_failures(11), 2);
        assert_eq!(policy.expected_failures(25), 3);

        assert!(!FailurePolicy::Never.should_fail(0));
        assert!(!FailurePolicy::EveryNth(0).should_fail(0));
    }

    #[tokio::test]
    async fn test_collect_ten() {
        let set = collector().collect(10).await.unwrap();

        assert_eq!(set.len(), 10);
        assert_eq!(set.get(0), Some(&Outcome::Err(SIMULATED_FAILURE.to_string())));
        for slot in 1..10 {
            assert!(set.get(slot).unwrap().is_ok(), "slot {} should succeed", slot);
        }
    }

    #[tokio::test]
    async fn test_collect_rejects_out_of_range() {
        let collector = Collector::with_config(
            Arc::new(SimulatedSampler::new(1)),
            CollectorConfig::default().with_max_concurrency(5),
        );

        assert!(matches!(
            collector.collect(0).await,
            Err(MonitorError::InvalidConcurrency { requested: 0, max: 5 })
        ));
        assert!(collector.collect(6).await.is_err());
        assert_eq!(collector.collect(5).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_collect_without_failures() {
        let collector = Collector::with_config(
            Arc::new(SimulatedSampler::new(3)),
            CollectorConfig::default().with_failure_policy(FailurePolicy::Never),
        );

        let set = collector.collect(20).await.unwrap();
        assert_eq!(set.len(), 20);
        assert_eq!(set.error_count(), 0);
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(5u8)), "unknown panic");
    }
}
