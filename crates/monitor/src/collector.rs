//! Host metric sampling.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use hostwatch_core::{LoadAverage, MetricsSnapshot, NetworkUsage, UsageStats};
use sysinfo::{Components, Disks, Networks, System};

use crate::error::CollectError;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Source of host snapshots.
#[async_trait::async_trait]
pub trait MetricsCollector: Send {
    async fn collect(&mut self) -> Result<MetricsSnapshot, CollectError>;
}

/// Samples the live host through `sysinfo`.
///
/// Refreshing is blocking work, so each sample runs on the blocking pool.
pub struct SysinfoCollector {
    state: Arc<Mutex<SysinfoState>>,
}

struct SysinfoState {
    system: System,
    disks: Disks,
    networks: Networks,
    components: Components,
    /// Network byte totals and time of the previous sample.
    last_network: (u64, u64, Instant),
    primed: bool,
}

impl SysinfoCollector {
    pub fn new() -> Self {
        let system = System::new_all();
        let networks = Networks::new_with_refreshed_list();
        let totals = network_totals(&networks);
        Self {
            state: Arc::new(Mutex::new(SysinfoState {
                system,
                disks: Disks::new_with_refreshed_list(),
                networks,
                components: Components::new_with_refreshed_list(),
                last_network: (totals.0, totals.1, Instant::now()),
                primed: false,
            })),
        }
    }
}

impl Default for SysinfoCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MetricsCollector for SysinfoCollector {
    async fn collect(&mut self) -> Result<MetricsSnapshot, CollectError> {
        let state = self.state.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = state.lock().map_err(|_| CollectError::Poisoned)?;
            Ok::<_, CollectError>(guard.sample())
        })
        .await
        .map_err(|e| CollectError::Task(e.to_string()))?
    }
}

impl SysinfoState {
    fn sample(&mut self) -> MetricsSnapshot {
        if !self.primed {
            // CPU usage is a delta between two refreshes.
            self.system.refresh_cpu_usage();
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            self.primed = true;
        }

        self.system.refresh_all();
        self.disks.refresh_list();
        self.networks.refresh();
        self.components.refresh();

        let mut snapshot = MetricsSnapshot::empty(Utc::now());
        snapshot.cpu = Some(f64::from(self.system.global_cpu_usage()));
        snapshot.ram = usage(self.system.used_memory(), self.system.total_memory());
        snapshot.disk = self.root_disk();
        snapshot.network = self.network_rate();
        snapshot.temperature = self.max_temperature();
        snapshot.process_count = self.system.processes().len() as u64;
        snapshot.load_average = load_average();

        tracing::debug!(
            cpu = ?snapshot.cpu,
            ram = ?snapshot.ram.map(|r| r.percent),
            disk = ?snapshot.disk.map(|d| d.percent),
            processes = snapshot.process_count,
            "host snapshot collected"
        );
        snapshot
    }

    /// Usage of the filesystem mounted at `/`, or the first disk reported.
    fn root_disk(&self) -> Option<UsageStats> {
        let list = self.disks.list();
        let disk = list
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| list.first())?;
        let total = disk.total_space();
        usage(total.saturating_sub(disk.available_space()), total)
    }

    /// Upload and download MB/s since the previous sample.
    fn network_rate(&mut self) -> Option<NetworkUsage> {
        let (rx, tx) = network_totals(&self.networks);
        let (last_rx, last_tx, last_at) = self.last_network;
        let now = Instant::now();
        self.last_network = (rx, tx, now);

        let secs = now.duration_since(last_at).as_secs_f64();
        if secs <= 0.0 {
            return None;
        }
        Some(NetworkUsage {
            upload_mb_s: tx.saturating_sub(last_tx) as f64 / BYTES_PER_MB / secs,
            download_mb_s: rx.saturating_sub(last_rx) as f64 / BYTES_PER_MB / secs,
        })
    }

    /// Hottest sensor reading, if the platform exposes any.
    fn max_temperature(&self) -> Option<f64> {
        self.components
            .iter()
            .map(|c| f64::from(c.temperature()))
            .filter(|t| t.is_finite() && *t > 0.0)
            .reduce(f64::max)
    }
}

fn network_totals(networks: &Networks) -> (u64, u64) {
    networks.iter().fold((0, 0), |(rx, tx), (_, data)| {
        (rx + data.total_received(), tx + data.total_transmitted())
    })
}

fn usage(used_bytes: u64, total_bytes: u64) -> Option<UsageStats> {
    if total_bytes == 0 {
        return None;
    }
    Some(UsageStats {
        total_gb: total_bytes as f64 / BYTES_PER_GB,
        used_gb: used_bytes as f64 / BYTES_PER_GB,
        percent: used_bytes as f64 / total_bytes as f64 * 100.0,
    })
}

fn load_average() -> Option<LoadAverage> {
    if cfg!(windows) {
        return None;
    }
    let load = System::load_average();
    Some(LoadAverage {
        one: load.one,
        five: load.five,
        fifteen: load.fifteen,
    })
}
