//! The Scheduler (C8): periodic housekeeping jobs — hourly disk-usage
//! checks, a daily metrics archive, and a weekly retention purge — plus an
//! on-demand consolidation trigger the Mode Manager can call when it wants
//! a fresh history snapshot before escalating. Follows the teacher's
//! supervisor loop idiom (`daemon/supervisor.rs`): a `tokio::select!`
//! between a `broadcast::Receiver<()>` shutdown signal and a timer, so a
//! job always finishes the file it's on before the daemon exits.

pub mod jobs;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, Weekday};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use aegis_storage::{LocalSessionStore, MetricsHistoryStore, ReflectionStore};
use aegis_telemetry::TelemetryBus;

use crate::governance::GovernanceStore;
use crate::sensor::SensorDaemon;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub disk_check_interval: Duration,
    pub archive_hour_local: u32,
    pub purge_weekday: Weekday,
    pub purge_hour_local: u32,
    pub session_retention_days: i64,
    pub reflection_retention_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            disk_check_interval: Duration::from_secs(3600),
            archive_hour_local: 2,
            purge_weekday: Weekday::Sun,
            purge_hour_local: 3,
            session_retention_days: 30,
            reflection_retention_days: 90,
        }
    }
}

/// Guards against a slow job still running when its own next tick arrives.
/// `try_lock` makes overlap detection non-blocking: a busy job is skipped
/// and logged rather than queued.
#[derive(Default)]
struct ReentrancyGuards {
    disk_check: Mutex<()>,
    archive: Mutex<()>,
    purge: Mutex<()>,
}

pub struct Scheduler {
    sensor: Arc<SensorDaemon>,
    governance: Arc<GovernanceStore>,
    telemetry: TelemetryBus,
    session_store: Arc<LocalSessionStore>,
    reflection_store: Arc<ReflectionStore>,
    metrics_history: Arc<MetricsHistoryStore>,
    config: SchedulerConfig,
    guards: ReentrancyGuards,
}

impl Scheduler {
    pub fn new(
        sensor: Arc<SensorDaemon>,
        governance: Arc<GovernanceStore>,
        telemetry: TelemetryBus,
        session_store: Arc<LocalSessionStore>,
        reflection_store: Arc<ReflectionStore>,
        metrics_history: Arc<MetricsHistoryStore>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            sensor,
            governance,
            telemetry,
            session_store,
            reflection_store,
            metrics_history,
            config,
            guards: ReentrancyGuards::default(),
        }
    }

    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut disk_interval = tokio::time::interval(self.config.disk_check_interval);
        disk_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            let archive_sleep = tokio::time::sleep(next_daily_local(self.config.archive_hour_local));
            let purge_sleep = tokio::time::sleep(next_weekly_local(
                self.config.purge_weekday,
                self.config.purge_hour_local,
            ));
            tokio::pin!(archive_sleep);
            tokio::pin!(purge_sleep);

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("scheduler shutting down");
                    break;
                }
                _ = disk_interval.tick() => {
                    self.run_disk_check().await;
                }
                _ = &mut archive_sleep => {
                    self.run_archive().await;
                }
                _ = &mut purge_sleep => {
                    self.run_purge().await;
                }
            }
        }
    }

    async fn run_disk_check(&self) {
        let Ok(_permit) = self.guards.disk_check.try_lock() else {
            warn!(target: "aegis::scheduler", "disk usage check already running, skipping tick");
            return;
        };
        jobs::emit_job_lifecycle(&self.telemetry, "disk_usage_check", true).await;
        jobs::run_disk_usage_check(&self.sensor, &self.governance, &self.telemetry).await;
        jobs::emit_job_lifecycle(&self.telemetry, "disk_usage_check", false).await;
    }

    async fn run_archive(&self) {
        let Ok(_permit) = self.guards.archive.try_lock() else {
            warn!(target: "aegis::scheduler", "archive job already running, skipping tick");
            return;
        };
        jobs::emit_job_lifecycle(&self.telemetry, "archive", true).await;
        let report = jobs::run_archive_job(&self.sensor, &self.metrics_history, 24 * 3600).await;
        info!(target: "aegis::scheduler", samples = report.samples_archived, "archive job completed");
        jobs::emit_job_lifecycle(&self.telemetry, "archive", false).await;
    }

    async fn run_purge(&self) {
        let Ok(_permit) = self.guards.purge.try_lock() else {
            warn!(target: "aegis::scheduler", "purge job already running, skipping tick");
            return;
        };
        jobs::emit_job_lifecycle(&self.telemetry, "purge", true).await;
        let report = jobs::run_purge_job(
            &self.session_store,
            &self.reflection_store,
            self.config.session_retention_days,
            self.config.reflection_retention_days,
        )
        .await;
        info!(
            target: "aegis::scheduler",
            sessions = report.sessions_purged,
            reflections = report.reflections_purged,
            "purge job completed"
        );
        jobs::emit_job_lifecycle(&self.telemetry, "purge", false).await;
    }

    /// Sensor-driven, on-demand consolidation: the Mode Manager calls this
    /// right before an escalation so the archived history reflects the
    /// conditions that triggered it, instead of waiting for 02:00.
    pub async fn consolidate_now(&self) {
        self.run_archive().await;
    }
}

fn next_daily_local(hour: u32) -> Duration {
    let now = Local::now();
    let mut next = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .expect("valid hour")
        .and_local_timezone(Local)
        .single()
        .unwrap_or(now);
    if next <= now {
        next += chrono::Duration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

fn next_weekly_local(weekday: Weekday, hour: u32) -> Duration {
    let now = Local::now();
    let mut days_ahead = (weekday.num_days_from_monday() as i64
        - now.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    let mut next = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .expect("valid hour")
        .and_local_timezone(Local)
        .single()
        .unwrap_or(now)
        + chrono::Duration::days(days_ahead);
    if next <= now {
        days_ahead += 7;
        next = now
            .date_naive()
            .and_hms_opt(hour, 0, 0)
            .expect("valid hour")
            .and_local_timezone(Local)
            .single()
            .unwrap_or(now)
            + chrono::Duration::days(days_ahead);
    }
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}
