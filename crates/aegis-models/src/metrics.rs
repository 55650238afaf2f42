//! Host metric snapshots and request-scoped summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub gpu_percent: Option<f64>,
    pub gpu_power_w: Option<f64>,
    pub gpu_temp_c: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let avg = samples.iter().sum::<f64>() / samples.len() as f64;
        Self { min, max, avg }
    }
}

/// Derived per-request resource summary, computed by the Request Monitor
/// from the Sensor Daemon's ring-buffer window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_s: f64,
    pub sample_count: usize,
    pub cpu: Stats,
    pub memory: Stats,
    pub gpu: Option<Stats>,
    pub threshold_violations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_from_samples() {
        let stats = Stats::from_samples(&[10.0, 20.0, 30.0]);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.avg, 20.0);
    }

    #[test]
    fn stats_from_empty_is_zeroed() {
        let stats = Stats::from_samples(&[]);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.0);
        assert_eq!(stats.avg, 0.0);
    }
}
