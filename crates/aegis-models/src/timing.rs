//! Timed request phases, classified by a fixed prefix table.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed classification of a span name's prefix into one of the phases
/// the request-trace summary aggregates over. Unknown prefixes map to
/// `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Context,
    Routing,
    LlmInference,
    ToolExecution,
    Synthesis,
    Persistence,
    Other,
}

impl Phase {
    /// Classify a span name (e.g. `"llm_call:standard"`,
    /// `"tool_execution:read_file"`) into its phase via a fixed prefix table.
    pub fn classify(span_name: &str) -> Self {
        let prefix = span_name.split(':').next().unwrap_or(span_name);
        match prefix {
            "setup" | "init" => Phase::Setup,
            "context" | "context_window" => Phase::Context,
            "routing" | "router" => Phase::Routing,
            "llm_call" | "llm_inference" => Phase::LlmInference,
            "tool_execution" | "tool_call" => Phase::ToolExecution,
            "synthesis" => Phase::Synthesis,
            "persistence" | "persist" => Phase::Persistence,
            _ => Phase::Other,
        }
    }
}

/// A single timed segment within a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSpan {
    pub name: String,
    /// Monotone sequence number within the owning `Timer`.
    pub sequence: u64,
    pub phase: Phase,
    pub offset_ms: u64,
    pub duration_ms: u64,
    #[serde(default)]
    pub metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_prefixes() {
        assert_eq!(Phase::classify("llm_call:standard"), Phase::LlmInference);
        assert_eq!(
            Phase::classify("tool_execution:read_file"),
            Phase::ToolExecution
        );
        assert_eq!(Phase::classify("setup"), Phase::Setup);
    }

    #[test]
    fn unknown_prefix_maps_to_other() {
        assert_eq!(Phase::classify("mystery_phase"), Phase::Other);
    }
}
