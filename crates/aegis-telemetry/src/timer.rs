//! Per-request timing. The Task Executor opens one `Timer` per request and
//! opens/closes a span around every phase of the state machine, producing a
//! breakdown that lands in the telemetry event emitted on completion.

use std::collections::BTreeMap;
use std::time::Instant;

use serde_json::json;

use aegis_models::{Phase, TimingSpan};

struct OpenSpan {
    name: String,
    phase: Phase,
    offset_ms: u64,
    started_at: Instant,
}

pub struct Timer {
    origin: Instant,
    sequence: u64,
    open: Vec<Option<OpenSpan>>,
    closed: Vec<TimingSpan>,
}

/// A handle to a span opened with `Timer::start`, passed back to `Timer::end`.
#[derive(Debug, Clone, Copy)]
pub struct SpanHandle(usize);

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            sequence: 0,
            open: Vec::new(),
            closed: Vec::new(),
        }
    }

    pub fn start(&mut self, name: impl Into<String>) -> SpanHandle {
        let name = name.into();
        let phase = Phase::classify(&name);
        let offset_ms = self.origin.elapsed().as_millis() as u64;
        self.open.push(Some(OpenSpan {
            name,
            phase,
            offset_ms,
            started_at: Instant::now(),
        }));
        SpanHandle(self.open.len() - 1)
    }

    pub fn end(&mut self, handle: SpanHandle) {
        let Some(slot) = self.open.get_mut(handle.0) else {
            return;
        };
        let Some(span) = slot.take() else {
            return;
        };
        let duration_ms = span.started_at.elapsed().as_millis() as u64;
        self.sequence += 1;
        self.closed.push(TimingSpan {
            name: span.name,
            sequence: self.sequence,
            phase: span.phase,
            offset_ms: span.offset_ms,
            duration_ms,
            metadata: json!({}),
        });
    }

    /// All closed spans, in closing order.
    pub fn to_breakdown(&self) -> Vec<TimingSpan> {
        self.closed.clone()
    }

    /// Total duration per phase, for a compact summary without the full
    /// per-span breakdown.
    pub fn to_summary(&self) -> BTreeMap<Phase, u64> {
        let mut totals: BTreeMap<Phase, u64> = BTreeMap::new();
        for span in &self.closed {
            *totals.entry(span.phase).or_insert(0) += span.duration_ms;
        }
        totals
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn start_end_records_a_span() {
        let mut timer = Timer::new();
        let handle = timer.start("llm_call:router");
        sleep(Duration::from_millis(5));
        timer.end(handle);
        let breakdown = timer.to_breakdown();
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].phase, Phase::LlmInference);
        assert!(breakdown[0].duration_ms >= 5);
    }

    #[test]
    fn summary_groups_by_phase() {
        let mut timer = Timer::new();
        let a = timer.start("tool_execution:read_file");
        timer.end(a);
        let b = timer.start("tool_execution:list_directory");
        timer.end(b);
        let summary = timer.to_summary();
        assert_eq!(summary.len(), 1);
        assert!(summary.contains_key(&Phase::ToolExecution));
    }
}
