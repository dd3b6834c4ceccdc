//! Samplers produce one [`Snapshot`] on demand.
//!
//! A sampler is an injected capability: the collector and the web layer hold
//! an `Arc<dyn Sampler>` and never know which implementation they drive.

use crate::metrics::data::Snapshot;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use sysinfo::{Disks, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};

/// Trait for taking a single metrics snapshot.
///
/// Implementations are called concurrently from many tasks and must keep
/// any mutable state behind their own synchronization. `sample` has no
/// error path; a panic inside it is caught by the collector and reported
/// as a failed outcome.
pub trait Sampler: Send + Sync {
    /// Take one snapshot of the current state.
    fn sample(&self) -> Snapshot;

    /// Short human-readable name, used in logs.
    fn name(&self) -> &str {
        "sampler"
    }
}

struct HostState {
    system: System,
    disks: Disks,
    networks: Networks,
    last_refresh: Instant,
    /// Network throughput (KiB/s) over the last completed refresh window
    network_rate: f64,
}

/// Sampler reading real host metrics through sysinfo.
///
/// The host is refreshed at most once per [`MINIMUM_CPU_UPDATE_INTERVAL`].
/// Samples taken inside one window, such as the slots of a single collection
/// run, share that window's readings and differ only in their timestamp.
/// Network usage is reported in KiB/s over the last window, so concurrent
/// slots all see the same rate instead of the first one taking every byte.
/// Samples taken before the first window closes report 0% CPU and 0 KiB/s.
pub struct SystemSampler {
    state: Mutex<HostState>,
}

impl SystemSampler {
    /// Create a new sampler with freshly loaded host information.
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_all();

        Self {
            state: Mutex::new(HostState {
                system,
                disks: Disks::new_with_refreshed_list(),
                networks: Networks::new_with_refreshed_list(),
                last_refresh: Instant::now(),
                network_rate: 0.0,
            }),
        }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl HostState {
    /// Refresh the host if the current window has closed.
    fn refresh(&mut self) {
        let elapsed = self.last_refresh.elapsed();
        if !window_closed(elapsed) {
            return;
        }

        self.system.refresh_all();
        self.disks.refresh();
        self.networks.refresh();
        self.network_rate = kib_per_second(self.network_bytes(), elapsed);
        self.last_refresh = Instant::now();
    }

    fn cpu_usage(&self) -> f64 {
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return 0.0;
        }
        cpus.iter().map(|cpu| cpu.cpu_usage() as f64).sum::<f64>() / cpus.len() as f64
    }

    fn memory_usage(&self) -> f64 {
        percent(self.system.used_memory(), self.system.total_memory())
    }

    fn disk_usage(&self) -> f64 {
        let (total, available) = self.disks.iter().fold((0u64, 0u64), |(t, a), disk| {
            (t + disk.total_space(), a + disk.available_space())
        });
        percent(total.saturating_sub(available), total)
    }

    /// Bytes received and transmitted on all interfaces during the last window.
    fn network_bytes(&self) -> u64 {
        self.networks
            .iter()
            .map(|(_, data)| data.received() + data.transmitted())
            .sum()
    }
}

fn window_closed(elapsed: Duration) -> bool {
    elapsed >= MINIMUM_CPU_UPDATE_INTERVAL
}

fn kib_per_second(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        0.0
    } else {
        bytes as f64 / 1024.0 / secs
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

impl Sampler for SystemSampler {
    fn sample(&self) -> Snapshot {
        // A poisoned lock only means another sample panicked mid-refresh;
        // the sysinfo handles stay usable.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.refresh();

        Snapshot::new(
            state.cpu_usage(),
            state.memory_usage(),
            state.disk_usage(),
            state.network_rate,
            state.system.processes().len() as u64,
        )
    }

    fn name(&self) -> &str {
        "system"
    }
}

/// Sampler producing plausible values from an explicitly seeded generator.
///
/// Two samplers built with the same seed yield the same sequence of
/// measurements when sampled in the same order.
pub struct SimulatedSampler {
    rng: Mutex<StdRng>,
}

impl SimulatedSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Sampler for SimulatedSampler {
    fn sample(&self) -> Snapshot {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        Snapshot::new(
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..100.0),
            rng.gen_range(30.0..50.0),
            rng.gen_range(10.0..25.0),
            rng.gen_range(50..300),
        )
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
