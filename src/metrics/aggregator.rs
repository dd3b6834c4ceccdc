//! Reduction of a result set into one average snapshot.

use crate::metrics::data::{AggregateSnapshot, ResultSet, Snapshot};
use chrono::{DateTime, Utc};

/// Average the successful outcomes of `results`, stamped with the current time.
pub fn aggregate(results: &ResultSet) -> AggregateSnapshot {
    aggregate_at(results, Utc::now())
}

/// Average the successful outcomes of `results`, stamped with `timestamp`.
///
/// Failed outcomes are ignored. With no successful outcome the result is
/// [`Snapshot::default`], whatever `timestamp` is. `process_count` is never
/// averaged and is always 0.
pub fn aggregate_at(results: &ResultSet, timestamp: DateTime<Utc>) -> AggregateSnapshot {
    let mut totals = Totals::default();
    for snapshot in results.successes() {
        totals.add(snapshot);
    }

    if totals.count == 0 {
        return Snapshot::default();
    }

    let count = totals.count as f64;
    Snapshot {
        cpu_usage: totals.cpu / count,
        memory_usage: totals.memory / count,
        disk_usage: totals.disk / count,
        network_usage: totals.network / count,
        timestamp,
        process_count: 0,
    }
}

#[derive(Default)]
struct Totals {
    cpu: f64,
    memory: f64,
    disk: f64,
    network: f64,
    count: usize,
}

impl Totals {
    fn add(&mut self, snapshot: &Snapshot) {
        self.cpu += snapshot.cpu_usage;
        self.memory += snapshot.memory_usage;
        self.disk += snapshot.disk_usage;
        self.network += snapshot.network_usage;
        self.count += 1;
    }
}
