//! Append-only telemetry event shape.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Severity of a telemetry event, mirrors `tracing::Level` without pulling
/// the dependency into the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A scalar, list, or map field value attached to a telemetry event.
pub type FieldValue = Value;

/// An append-only telemetry event. Never mutated after emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    pub event_name: String,
    pub trace_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<Uuid>,
    pub level: EventLevel,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl TelemetryEvent {
    pub fn new(event_name: impl Into<String>, trace_id: Uuid, level: EventLevel) -> Self {
        Self {
            timestamp: Utc::now(),
            event_name: event_name.into(),
            trace_id,
            span_id: None,
            level,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_span(mut self, span_id: Uuid) -> Self {
        self.span_id = Some(span_id);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Deterministic document id for idempotent re-indexing into a
    /// search-index sink (`trace_{trace_id}` / `trace_{trace_id}_step_{n}`).
    pub fn document_id(&self) -> String {
        format!("trace_{}", self.trace_id)
    }
}
