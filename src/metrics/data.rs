//! Data structures for sampled metrics and collection results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One set of resource-usage measurements at a point in time.
///
/// The all-zero `Default` (timestamp at the Unix epoch) doubles as the
/// aggregate of a run with no successful samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// CPU usage percentage (0.0 to 100.0)
    pub cpu_usage: f64,
    /// Memory usage percentage (0.0 to 100.0)
    pub memory_usage: f64,
    /// Disk usage percentage (0.0 to 100.0)
    pub disk_usage: f64,
    /// Network throughput since the previous sample
    pub network_usage: f64,
    /// When the snapshot was taken, or aggregated
    pub timestamp: DateTime<Utc>,
    /// Number of processes running
    pub process_count: u64,
}

/// A snapshot whose numeric fields are means over a result set.
pub type AggregateSnapshot = Snapshot;

impl Snapshot {
    /// Create a snapshot stamped with the current time.
    pub fn new(
        cpu_usage: f64,
        memory_usage: f64,
        disk_usage: f64,
        network_usage: f64,
        process_count: u64,
    ) -> Self {
        Self {
            cpu_usage,
            memory_usage,
            disk_usage,
            network_usage,
            timestamp: Utc::now(),
            process_count,
        }
    }

    /// Overall health score in `[0, 100]`, higher is better.
    ///
    /// Network load weighs half as much as the other three measurements.
    pub fn performance_score(&self) -> f64 {
        let score = (100.0 - self.cpu_usage)
            + (100.0 - self.memory_usage)
            + (100.0 - self.disk_usage)
            + (100.0 - self.network_usage * 0.5);
        (score / 4.0).clamp(0.0, 100.0)
    }
}

/// Success or failure of one sampling attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Outcome {
    Ok(Snapshot),
    Err(String),
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        matches!(self, Outcome::Err(_))
    }

    /// The snapshot, if the attempt succeeded.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Outcome::Ok(snapshot) => Some(snapshot),
            Outcome::Err(_) => None,
        }
    }

    /// The failure message, if the attempt failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Err(message) => Some(message),
        }
    }
}

/// The outcome reported by one task slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Index of the task within its collection run
    pub slot: usize,
    pub outcome: Outcome,
}

impl TaskResult {
    pub fn new(slot: usize, outcome: Outcome) -> Self {
        Self { slot, outcome }
    }
}

/// Every outcome of one collection run, in completion order.
///
/// The order carries no meaning; consumers must not depend on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    /// Identifier of the run that produced these results
    pub run_id: Uuid,
    results: Vec<TaskResult>,
}

impl ResultSet {
    /// Build a result set from already-gathered task results.
    pub fn from_results(results: Vec<TaskResult>) -> Self {
        Self::with_run_id(Uuid::new_v4(), results)
    }

    pub(crate) fn with_run_id(run_id: Uuid, results: Vec<TaskResult>) -> Self {
        Self { run_id, results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter()
    }

    /// Snapshots of the successful attempts.
    pub fn successes(&self) -> impl Iterator<Item = &Snapshot> {
        self.results.iter().filter_map(|r| r.outcome.snapshot())
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_ok()).count()
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_err()).count()
    }

    /// The outcome reported by `slot`, if that slot is part of the set.
    pub fn get(&self, slot: usize) -> Option<&Outcome> {
        self.results
            .iter()
            .find(|r| r.slot == slot)
            .map(|r| &r.outcome)
    }

    pub fn into_inner(self) -> Vec<TaskResult> {
        self.results
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a TaskResult;
    type IntoIter = std::slice::Iter<'a, TaskResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_zero() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.cpu_usage, 0.0);
        assert_eq!(snapshot.memory_usage, 0.0);
        assert_eq!(snapshot.disk_usage, 0.0);
        assert_eq!(snapshot.network_usage, 0.0);
        assert_eq!(snapshot.process_count, 0);
        assert_eq!(snapshot.timestamp.timestamp(), 0);
    }

    #[test]
    fn test_performance_score_bounds() {
        let idle = Snapshot::new(0.0, 0.0, 0.0, 0.0, 1);
        assert_eq!(idle.performance_score(), 100.0);

        let saturated = Snapshot::new(100.0, 100.0, 100.0, 400.0, 1);
        assert_eq!(saturated.performance_score(), 0.0);

        let mixed = Snapshot::new(20.0, 40.0, 60.0, 20.0, 1);
        // (80 + 60 + 40 + 90) / 4
        assert!((mixed.performance_score() - 67.5).abs() < 1e-9);
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let err = Outcome::Err("boom".to_string());
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["status"], "err");
        assert_eq!(value["value"], "boom");

        let ok = Outcome::Ok(Snapshot::default());
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["status"], "ok");
        assert!(value["value"].get("cpu_usage").is_some());
    }

    #[test]
    fn test_result_set_counts() {
        let set = ResultSet::from_results(vec![
            TaskResult::new(0, Outcome::Err("failed".to_string())),
            TaskResult::new(1, Outcome::Ok(Snapshot::default())),
            TaskResult::new(2, Outcome::Ok(Snapshot::default())),
        ]);

        assert_eq!(set.len(), 3);
        assert_eq!(set.success_count(), 2);
        assert_eq!(set.error_count(), 1);
        assert_eq!(set.successes().count(), 2);
        assert!(set.get(0).unwrap().is_err());
        assert!(set.get(7).is_none());
    }
}
