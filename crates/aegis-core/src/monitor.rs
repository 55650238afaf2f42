//! The Request Monitor (C9): wraps a single request's lifetime, sampling
//! the Sensor Daemon's window at `Stop()` to produce a `MetricsSummary`
//! with any threshold violations observed during the request, rather than
//! polling on its own.

use chrono::Utc;

use aegis_models::{MetricsSummary, Mode, Stats};

use crate::governance::GovernanceStore;
use crate::sensor::SensorDaemon;

pub struct RequestMonitor<'a> {
    sensor: &'a SensorDaemon,
    started_at: chrono::DateTime<Utc>,
}

impl<'a> RequestMonitor<'a> {
    pub fn start(sensor: &'a SensorDaemon) -> Self {
        Self {
            sensor,
            started_at: Utc::now(),
        }
    }

    /// Summarize the Sensor Daemon's history over this request's lifetime
    /// and flag any sample that breached the thresholds for `mode`.
    pub fn stop(self, mode: Mode, governance: &GovernanceStore) -> MetricsSummary {
        let end = Utc::now();
        let elapsed_seconds = (end - self.started_at).num_seconds().max(1) as u64;
        let samples = self.sensor.window(elapsed_seconds);

        let cpu = Stats::from_samples(&samples.iter().map(|s| s.cpu_percent).collect::<Vec<_>>());
        let memory = Stats::from_samples(&samples.iter().map(|s| s.memory_percent).collect::<Vec<_>>());
        let gpu_samples: Vec<f64> = samples.iter().filter_map(|s| s.gpu_percent).collect();
        let gpu = if gpu_samples.is_empty() {
            None
        } else {
            Some(Stats::from_samples(&gpu_samples))
        };

        let thresholds = governance.mode_thresholds(mode);
        let mut threshold_violations = Vec::new();
        for sample in &samples {
            if let Some(limit) = thresholds.cpu_percent {
                if sample.cpu_percent > limit {
                    threshold_violations.push(format!("cpu {:.1}% exceeded {:.1}%", sample.cpu_percent, limit));
                }
            }
            if let Some(limit) = thresholds.memory_percent {
                if sample.memory_percent > limit {
                    threshold_violations.push(format!(
                        "memory {:.1}% exceeded {:.1}%",
                        sample.memory_percent, limit
                    ));
                }
            }
        }

        MetricsSummary {
            start: self.started_at,
            end,
            duration_s: (end - self.started_at).num_milliseconds() as f64 / 1000.0,
            sample_count: samples.len(),
            cpu,
            memory,
            gpu,
            threshold_violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn stop_with_no_samples_is_empty_but_valid() {
        let sensor = SensorDaemon::new(Default::default(), aegis_telemetry::TelemetryBus::new());
        let governance = GovernanceStore::new(HashMap::new(), HashMap::new());
        let monitor = RequestMonitor::start(&sensor);
        let summary = monitor.stop(Mode::Normal, &governance);
        assert_eq!(summary.sample_count, 0);
        assert!(summary.threshold_violations.is_empty());
    }
}
