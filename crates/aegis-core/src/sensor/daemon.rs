//! The Sensor Daemon (C3): polls host resource usage on a fixed interval
//! and answers non-blocking `Latest()`/`Window(seconds)` queries from a
//! bounded ring buffer. GPU sampling degrades silently when no GPU is
//! present or `sysinfo` can't read one — see §4.3 "GPU fields are always
//! optional; their absence is never an error."
//!
//! The poll loop follows the teacher's supervisor shutdown idiom: a
//! `tokio::select!` between a `broadcast::Receiver<()>` and an interval
//! tick, so the daemon can be cancelled from the outside without a flag.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use sysinfo::{Disks, System};
use tokio::sync::broadcast;
use tracing::{info, warn};

use aegis_models::{EventLevel, MetricSnapshot, TraceContext};
use aegis_telemetry::TelemetryBus;

use crate::sensor::ring_buffer::{SnapshotRing, DEFAULT_CAPACITY};

#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub poll_interval: Duration,
    pub ring_capacity: usize,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            ring_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Host resource sampler. Cheap to clone (an `Arc` handle); the poll loop
/// runs in its own task started by the caller.
#[derive(Clone)]
pub struct SensorDaemon {
    ring: Arc<RwLock<SnapshotRing>>,
    config: SensorConfig,
    telemetry: TelemetryBus,
}

impl SensorDaemon {
    pub fn new(config: SensorConfig, telemetry: TelemetryBus) -> Self {
        Self {
            ring: Arc::new(RwLock::new(SnapshotRing::new(config.ring_capacity))),
            config,
            telemetry,
        }
    }

    pub fn latest(&self) -> Option<MetricSnapshot> {
        self.ring.read().latest()
    }

    pub fn window(&self, seconds: u64) -> Vec<MetricSnapshot> {
        self.ring.read().window(seconds)
    }

    /// Run the poll loop until `shutdown` fires. Intended to be spawned as
    /// its own task; never panics on a sampling failure, only logs it and
    /// skips that tick.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut sys = System::new_all();
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("sensor daemon shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let snapshot = Self::sample(&mut sys);
                    self.ring.write().push(snapshot);
                    self.emit_poll_event(&snapshot).await;
                }
            }
        }
    }

    fn sample(sys: &mut System) -> MetricSnapshot {
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        let cpu_percent = sys.global_cpu_usage() as f64;
        let memory_percent = if sys.total_memory() > 0 {
            sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0
        } else {
            0.0
        };

        let disk_percent = Self::sample_disk_percent();
        let (gpu_percent, gpu_power_w, gpu_temp_c) = Self::sample_gpu();

        MetricSnapshot {
            timestamp: chrono::Utc::now(),
            cpu_percent,
            memory_percent,
            disk_percent,
            gpu_percent,
            gpu_power_w,
            gpu_temp_c,
        }
    }

    fn sample_disk_percent() -> f64 {
        let disks = Disks::new_with_refreshed_list();
        let (total, available) = disks
            .iter()
            .fold((0u64, 0u64), |(t, a), d| (t + d.total_space(), a + d.available_space()));
        if total == 0 {
            return 0.0;
        }
        let used = total.saturating_sub(available);
        used as f64 / total as f64 * 100.0
    }

    /// No portable cross-vendor GPU sampler ships in the base dependency
    /// stack; this returns `None` rather than fabricating a reading.
    fn sample_gpu() -> (Option<f64>, Option<f64>, Option<f64>) {
        (None, None, None)
    }

    async fn emit_poll_event(&self, snapshot: &MetricSnapshot) {
        let trace = TraceContext::new();
        self.telemetry
            .begin(&trace, "sensor_poll")
            .level(EventLevel::Debug)
            .field("cpu_percent", snapshot.cpu_percent)
            .field("memory_percent", snapshot.memory_percent)
            .field("disk_percent", snapshot.disk_percent)
            .send(&self.telemetry)
            .await;
        if snapshot.gpu_percent.is_none() {
            warn!(target: "aegis::sensor", "gpu sampling unavailable, degrading silently");
        }
    }
}
