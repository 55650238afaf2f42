//! The telemetry bus: the single place every component emits structured
//! events through, fanned out to whatever sinks are configured.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use aegis_models::{EventLevel, TelemetryEvent, TraceContext};

use crate::sink::{SharedSink, TelemetrySink};

#[derive(Clone)]
pub struct TelemetryBus {
    sinks: Vec<SharedSink>,
}

impl Default for TelemetryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryBus {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: impl TelemetrySink + 'static) {
        self.sinks.push(Arc::new(sink));
    }

    pub async fn emit(&self, event: TelemetryEvent) {
        tracing::event!(
            target: "aegis::telemetry",
            tracing::Level::INFO,
            trace_id = %event.trace_id,
            event_name = %event.event_name,
            "{}",
            event.event_name
        );
        for sink in &self.sinks {
            if let Err(err) = sink.write(&event).await {
                tracing::warn!(error = %err, "telemetry sink write failed");
            }
        }
    }

    pub fn begin(&self, trace: &TraceContext, event_name: impl Into<String>) -> Emit {
        Emit::new(trace.trace_id, event_name)
    }
}

/// Fluent builder for a single telemetry event, emitted with `.send(&bus)`.
pub struct Emit {
    trace_id: Uuid,
    span_id: Option<Uuid>,
    event_name: String,
    level: EventLevel,
    fields: Vec<(String, Value)>,
}

impl Emit {
    pub fn new(trace_id: Uuid, event_name: impl Into<String>) -> Self {
        Self {
            trace_id,
            span_id: None,
            event_name: event_name.into(),
            level: EventLevel::Info,
            fields: Vec::new(),
        }
    }

    pub fn span(mut self, span_id: Uuid) -> Self {
        self.span_id = Some(span_id);
        self
    }

    pub fn level(mut self, level: EventLevel) -> Self {
        self.level = level;
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> TelemetryEvent {
        let mut event = TelemetryEvent::new(self.event_name, self.trace_id, self.level);
        if let Some(span_id) = self.span_id {
            event = event.with_span(span_id);
        }
        for (key, value) in self.fields {
            event = event.with_field(key, value);
        }
        event
    }

    pub async fn send(self, bus: &TelemetryBus) {
        bus.emit(self.build()).await;
    }
}
