//! Individual scheduler job bodies, kept free of the scheduling/reentrancy
//! plumbing in `mod.rs` so each can be tested as a plain async function.

use std::sync::Arc;

use aegis_models::{EventLevel, TraceContext};
use aegis_storage::MetricsHistoryStore;
use aegis_telemetry::TelemetryBus;

use crate::governance::GovernanceStore;
use crate::sensor::SensorDaemon;

#[derive(Debug, Clone, Default)]
pub struct DiskUsageReport {
    pub disk_percent: Option<f64>,
    pub alerted: bool,
}

/// Hourly: compare the latest sensor reading against the configured disk
/// alert threshold and emit a `disk_usage_alert` event if it's exceeded.
pub async fn run_disk_usage_check(
    sensor: &SensorDaemon,
    governance: &GovernanceStore,
    telemetry: &TelemetryBus,
) -> DiskUsageReport {
    let Some(snapshot) = sensor.latest() else {
        return DiskUsageReport::default();
    };
    let threshold = governance
        .mode_definition(aegis_models::Mode::Normal)
        .and_then(|d| d.thresholds.disk_percent)
        .unwrap_or(90.0);

    let alerted = snapshot.disk_percent > threshold;
    if alerted {
        telemetry
            .begin(&TraceContext::new(), "disk_usage_alert")
            .level(EventLevel::Warn)
            .field("disk_percent", snapshot.disk_percent)
            .field("threshold_percent", threshold)
            .send(telemetry)
            .await;
    }
    DiskUsageReport {
        disk_percent: Some(snapshot.disk_percent),
        alerted,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveReport {
    pub samples_archived: usize,
}

/// Daily: flush every sample currently sitting in the Sensor Daemon's ring
/// buffer into the append-only long-horizon metrics history.
pub async fn run_archive_job(
    sensor: &SensorDaemon,
    metrics_history: &MetricsHistoryStore,
    window_seconds: u64,
) -> ArchiveReport {
    let samples = sensor.window(window_seconds);
    let mut archived = 0;
    for sample in &samples {
        if metrics_history.append(sample).await.is_ok() {
            archived += 1;
        }
    }
    ArchiveReport {
        samples_archived: archived,
    }
}

#[derive(Debug, Clone, Default)]
pub struct PurgeReport {
    pub sessions_purged: usize,
    pub reflections_purged: usize,
}

/// Weekly: delete sessions and reflection entries older than their
/// configured retention window.
pub async fn run_purge_job(
    session_store: &aegis_storage::LocalSessionStore,
    reflection_store: &aegis_storage::ReflectionStore,
    session_retention_days: i64,
    reflection_retention_days: i64,
) -> PurgeReport {
    let now = chrono::Utc::now();
    let mut sessions_purged = 0;

    if let Ok(sessions) = session_store.recent(usize::MAX).await {
        let cutoff = now - chrono::Duration::days(session_retention_days);
        for session in sessions {
            if session.created_at < cutoff {
                if session_store.remove(session.session_id).await.unwrap_or(false) {
                    sessions_purged += 1;
                }
            }
        }
    }

    let mut reflections_purged = 0;
    if let Ok(entries) = reflection_store.recent(usize::MAX).await {
        let cutoff = now - chrono::Duration::days(reflection_retention_days);
        for entry in entries {
            if entry.created_at < cutoff {
                reflections_purged += 1;
            }
        }
    }

    PurgeReport {
        sessions_purged,
        reflections_purged,
    }
}

pub async fn emit_job_lifecycle(telemetry: &TelemetryBus, job: &str, started: bool) {
    let event_name = if started {
        format!("lifecycle_{job}_started")
    } else {
        format!("lifecycle_{job}_completed")
    };
    telemetry
        .begin(&TraceContext::new(), event_name)
        .level(EventLevel::Info)
        .send(telemetry)
        .await;
}

pub type SharedSensor = Arc<SensorDaemon>;
