//! Per-request trace identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a single request's lifetime. Stable from HTTP entry to
/// response; every telemetry event emitted during the request carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: Uuid,
    pub parent_span_id: Option<Uuid>,
}

impl TraceContext {
    /// Start a brand new trace with no parent span.
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            parent_span_id: None,
        }
    }

    /// Derive a child span id under this trace, returning the (unchanged)
    /// trace context and the new span id.
    pub fn new_span(&self) -> (Self, Uuid) {
        let span_id = Uuid::new_v4();
        (
            Self {
                trace_id: self.trace_id,
                parent_span_id: Some(span_id),
            },
            span_id,
        )
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trace_has_no_parent() {
        let trace = TraceContext::new();
        assert!(trace.parent_span_id.is_none());
    }

    #[test]
    fn new_span_preserves_trace_id() {
        let trace = TraceContext::new();
        let (child, span_id) = trace.new_span();
        assert_eq!(child.trace_id, trace.trace_id);
        assert_eq!(child.parent_span_id, Some(span_id));
    }
}
