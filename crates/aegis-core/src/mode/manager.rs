//! The Mode Manager (C4): the Normal→Alert→Degraded→Lockdown escalation
//! ladder and its Recovery path back down, evaluated from Sensor Daemon
//! snapshots against the loaded threshold table. A single mutex around
//! `current` and `history` ensures only one transition is ever in flight
//! (§4.4 "transitions are serialized; concurrent evaluations never race").

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;

use aegis_models::{EventLevel, MetricSnapshot, Mode, ModeDefinition, ModeTransitionRecord, TraceContext};
use aegis_telemetry::TelemetryBus;

use crate::governance::GovernanceStore;
use crate::scheduler::Scheduler;

const DEFAULT_HISTORY_CAPACITY: usize = 50;

struct State {
    current: Mode,
    since: chrono::DateTime<Utc>,
    history: VecDeque<ModeTransitionRecord>,
    /// How long the current mode's entry thresholds have been continuously
    /// violated, used against each mode's `sustained_seconds` requirement.
    violation_started_at: Option<chrono::DateTime<Utc>>,
    /// How long thresholds have been continuously clear while above Normal,
    /// used against `sustained_seconds * 2` before stepping down a rung
    /// (§4.4: recovery requires double the escalation's sustain window).
    clear_started_at: Option<chrono::DateTime<Utc>>,
}

pub struct ModeManager {
    state: Mutex<State>,
    history_capacity: usize,
    telemetry: TelemetryBus,
    /// Set once the Scheduler exists, after both collaborators are built at
    /// startup. Escalations that land before it's set just skip the
    /// consolidation trigger — evaluated lazily, never required.
    scheduler: OnceLock<Arc<Scheduler>>,
}

impl ModeManager {
    pub fn new(telemetry: TelemetryBus) -> Self {
        Self {
            state: Mutex::new(State {
                current: Mode::Normal,
                since: Utc::now(),
                history: VecDeque::new(),
                violation_started_at: None,
                clear_started_at: None,
            }),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            telemetry,
            scheduler: OnceLock::new(),
        }
    }

    /// Give the Mode Manager a handle to the Scheduler so an escalation can
    /// trigger an on-demand consolidation instead of waiting for the
    /// archive job's next scheduled run. Idempotent; later calls are
    /// ignored.
    pub fn set_scheduler(&self, scheduler: Arc<Scheduler>) {
        let _ = self.scheduler.set(scheduler);
    }

    pub fn current(&self) -> Mode {
        self.state.lock().current
    }

    pub fn history(&self) -> Vec<ModeTransitionRecord> {
        self.state.lock().history.iter().cloned().collect()
    }

    /// Force a transition, bypassing threshold evaluation, used by an
    /// operator-initiated recovery command or a manual lockdown.
    pub async fn transition_to(&self, to: Mode, reason: impl Into<String>, governance: &GovernanceStore) {
        let reason = reason.into();
        let from = {
            let mut state = self.state.lock();
            let from = state.current;
            if from == to {
                return;
            }
            state.current = to;
            state.since = Utc::now();
            state.violation_started_at = None;
            state.clear_started_at = None;
            Self::record(&mut state, from, to, &reason, json!({}), self.history_capacity);
            from
        };
        self.emit_transition(from, to, &reason).await;
        let _ = governance;
    }

    /// Evaluate a fresh sensor snapshot against the current mode's
    /// thresholds and the one above it, transitioning if a violation has
    /// been sustained long enough. No-op if nothing crosses a threshold.
    pub async fn evaluate_from_metrics(&self, snapshot: &MetricSnapshot, governance: &GovernanceStore) {
        let current = self.current();

        if let Some(violated) = Self::threshold_violated(governance, current, snapshot) {
            let sustained = governance
                .mode_definition(current)
                .map(|d| d.sustained_seconds)
                .unwrap_or(60);
            let should_escalate = {
                let mut state = self.state.lock();
                let started = *state.violation_started_at.get_or_insert(Utc::now());
                state.clear_started_at = None;
                (Utc::now() - started).num_seconds() as u64 >= sustained
            };
            if should_escalate {
                if let Some(next) = current.stricter() {
                    if Self::transition_allowed(governance, current, next) {
                        self.commit_transition(current, next, violated, snapshot).await;
                    }
                }
            }
            return;
        }

        // No active violation this poll: clear the escalation-sustain timer.
        self.state.lock().violation_started_at = None;

        // Recovery requires thresholds to stay clear for twice the
        // escalation's sustain window before stepping down one rung, so a
        // single clean sample doesn't immediately undo an escalation.
        let Some(next) = current.looser() else {
            self.state.lock().clear_started_at = None;
            return;
        };
        if !Self::transition_allowed(governance, current, next) {
            return;
        }

        let clear_window = governance
            .mode_definition(current)
            .map(|d| d.sustained_seconds * 2)
            .unwrap_or(120);
        let should_recover = {
            let mut state = self.state.lock();
            let started = *state.clear_started_at.get_or_insert(Utc::now());
            (Utc::now() - started).num_seconds() as u64 >= clear_window
        };
        if should_recover {
            self.commit_transition(
                current,
                next,
                "resource usage clear of thresholds for the recovery window".to_string(),
                snapshot,
            )
            .await;
        }
    }

    fn transition_allowed(governance: &GovernanceStore, from: Mode, to: Mode) -> bool {
        governance
            .mode_definition(from)
            .map(|def| def.allowed_transitions.contains(&to))
            .unwrap_or(false)
    }

    fn threshold_violated(
        governance: &GovernanceStore,
        mode: Mode,
        snapshot: &MetricSnapshot,
    ) -> Option<String> {
        let thresholds = governance.mode_definition(mode)?.thresholds.clone();
        if let Some(limit) = thresholds.cpu_percent {
            if snapshot.cpu_percent > limit {
                return Some(format!("cpu {:.1}% exceeds {:.1}%", snapshot.cpu_percent, limit));
            }
        }
        if let Some(limit) = thresholds.memory_percent {
            if snapshot.memory_percent > limit {
                return Some(format!("memory {:.1}% exceeds {:.1}%", snapshot.memory_percent, limit));
            }
        }
        if let Some(limit) = thresholds.disk_percent {
            if snapshot.disk_percent > limit {
                return Some(format!("disk {:.1}% exceeds {:.1}%", snapshot.disk_percent, limit));
            }
        }
        if let (Some(limit), Some(gpu)) = (thresholds.gpu_percent, snapshot.gpu_percent) {
            if gpu > limit {
                return Some(format!("gpu {gpu:.1}% exceeds {limit:.1}%"));
            }
        }
        None
    }

    async fn commit_transition(&self, from: Mode, to: Mode, reason: String, snapshot: &MetricSnapshot) {
        {
            let mut state = self.state.lock();
            state.current = to;
            state.since = Utc::now();
            state.violation_started_at = None;
            state.clear_started_at = None;
            let evidence = json!({
                "cpu_percent": snapshot.cpu_percent,
                "memory_percent": snapshot.memory_percent,
                "disk_percent": snapshot.disk_percent,
            });
            Self::record(&mut state, from, to, &reason, evidence, self.history_capacity);
        }
        if from.stricter() == Some(to) {
            self.trigger_consolidation();
        }
        self.emit_transition(from, to, &reason).await;
    }

    /// Kick the archive job off the hot path of a transition: an escalation
    /// shouldn't wait on disk I/O before its `mode_transition` event lands.
    fn trigger_consolidation(&self) {
        if let Some(scheduler) = self.scheduler.get().cloned() {
            tokio::spawn(async move {
                scheduler.consolidate_now().await;
            });
        }
    }

    fn record(
        state: &mut State,
        from: Mode,
        to: Mode,
        reason: &str,
        evidence: serde_json::Value,
        capacity: usize,
    ) {
        if state.history.len() == capacity {
            state.history.pop_front();
        }
        state.history.push_back(ModeTransitionRecord {
            from,
            to,
            reason: reason.to_string(),
            evidence,
            at: Utc::now(),
        });
    }

    async fn emit_transition(&self, from: Mode, to: Mode, reason: &str) {
        let trace = TraceContext::new();
        self.telemetry
            .begin(&trace, "mode_transition")
            .level(EventLevel::Warn)
            .field("from", format!("{from:?}"))
            .field("to", format!("{to:?}"))
            .field("reason", reason)
            .send(&self.telemetry)
            .await;
    }

    pub fn mode_definition_snapshot(&self, governance: &GovernanceStore) -> Option<ModeDefinition> {
        governance.mode_definition(self.current()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn snapshot(cpu: f64) -> MetricSnapshot {
        MetricSnapshot {
            timestamp: Utc::now(),
            cpu_percent: cpu,
            memory_percent: 10.0,
            disk_percent: 10.0,
            gpu_percent: None,
            gpu_power_w: None,
            gpu_temp_c: None,
        }
    }

    fn governance_from_default() -> GovernanceStore {
        let file: crate::governance::PolicyFile =
            toml::from_str(crate::governance::PolicyFile::default_document()).unwrap();
        GovernanceStore::new(file.mode_definitions().unwrap(), HashMap::new())
    }

    #[tokio::test]
    async fn starts_in_normal() {
        let manager = ModeManager::new(TelemetryBus::new());
        assert_eq!(manager.current(), Mode::Normal);
    }

    #[tokio::test]
    async fn transition_to_records_history() {
        let manager = ModeManager::new(TelemetryBus::new());
        let governance = governance_from_default();
        manager.transition_to(Mode::Alert, "manual override", &governance).await;
        assert_eq!(manager.current(), Mode::Alert);
        assert_eq!(manager.history().len(), 1);
    }

    #[tokio::test]
    async fn sustained_violation_escalates_after_window() {
        let manager = ModeManager::new(TelemetryBus::new());
        let governance = governance_from_default();
        let hot = snapshot(99.0);

        manager.evaluate_from_metrics(&hot, &governance).await;
        assert_eq!(manager.current(), Mode::Normal, "single violated sample shouldn't escalate yet");

        {
            let mut state = manager.state.lock();
            state.violation_started_at = Some(Utc::now() - chrono::Duration::seconds(120));
        }
        manager.evaluate_from_metrics(&hot, &governance).await;
        assert_eq!(manager.current(), Mode::Alert);
    }

    #[tokio::test]
    async fn normal_readings_do_not_transition_from_normal() {
        let manager = ModeManager::new(TelemetryBus::new());
        let governance = governance_from_default();
        manager.evaluate_from_metrics(&snapshot(5.0), &governance).await;
        assert_eq!(manager.current(), Mode::Normal);
    }

    #[tokio::test]
    async fn recovery_requires_sustained_clear_window_before_stepping_down() {
        let manager = ModeManager::new(TelemetryBus::new());
        let governance = governance_from_default();
        manager
            .transition_to(Mode::Alert, "manual escalation for test", &governance)
            .await;

        let cool = snapshot(5.0);
        manager.evaluate_from_metrics(&cool, &governance).await;
        assert_eq!(
            manager.current(),
            Mode::Alert,
            "a single clear sample shouldn't step down immediately"
        );

        {
            let mut state = manager.state.lock();
            state.clear_started_at = Some(Utc::now() - chrono::Duration::seconds(121));
        }
        manager.evaluate_from_metrics(&cool, &governance).await;
        assert_eq!(manager.current(), Mode::Recovery);
    }

    #[tokio::test]
    async fn renewed_violation_resets_the_clear_window() {
        let manager = ModeManager::new(TelemetryBus::new());
        let governance = governance_from_default();
        manager
            .transition_to(Mode::Alert, "manual escalation for test", &governance)
            .await;

        {
            let mut state = manager.state.lock();
            state.clear_started_at = Some(Utc::now() - chrono::Duration::seconds(121));
        }
        // A fresh violation should reset the clear window rather than let a
        // stale timer step the mode down on the next clear sample.
        manager.evaluate_from_metrics(&snapshot(99.0), &governance).await;
        assert_eq!(manager.current(), Mode::Alert);

        manager.evaluate_from_metrics(&snapshot(5.0), &governance).await;
        assert_eq!(
            manager.current(),
            Mode::Alert,
            "clear window should have restarted, not still be expired"
        );
    }

    #[tokio::test]
    async fn escalation_triggers_scheduler_consolidation() {
        use crate::scheduler::{Scheduler, SchedulerConfig};
        use crate::sensor::SensorDaemon;
        use aegis_storage::{LocalSessionStore, MetricsHistoryStore, ReflectionStore};

        let dir = tempfile::tempdir().unwrap();
        let telemetry = TelemetryBus::new();
        let manager = ModeManager::new(telemetry.clone());
        let governance = Arc::new(governance_from_default());
        let sensor = Arc::new(SensorDaemon::new(Default::default(), telemetry.clone()));
        let session_store = Arc::new(LocalSessionStore::open(dir.path()).await.unwrap());
        let reflection_store = Arc::new(ReflectionStore::open(dir.path()).await.unwrap());
        let metrics_history = Arc::new(MetricsHistoryStore::open(dir.path()).await.unwrap());

        let scheduler = Arc::new(Scheduler::new(
            sensor,
            governance.clone(),
            telemetry,
            session_store,
            reflection_store,
            metrics_history,
            SchedulerConfig::default(),
        ));
        manager.set_scheduler(scheduler);

        manager
            .commit_transition(Mode::Normal, Mode::Alert, "test escalation".to_string(), &snapshot(99.0))
            .await;
        assert_eq!(manager.current(), Mode::Alert);

        // `trigger_consolidation` fires a detached task; give it a chance to
        // run. Nothing here asserts on its effects directly (the archive job
        // is a no-op with no sensor samples) — this just proves the call
        // site doesn't panic or deadlock when a scheduler is attached.
        tokio::task::yield_now().await;
    }
}
