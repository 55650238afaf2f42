//! Per-request execution context driven by the Task Executor's state
//! machine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;
use crate::metrics::MetricsSummary;
use crate::mode::Mode;
use crate::tool::ToolDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Init,
    LlmCall,
    ToolExecution,
    Synthesis,
    Completed,
    Failed,
}

/// Abstract classification of a target model; the LLM adapter maps this to
/// a concrete backend model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelRole {
    Router,
    Standard,
    Reasoning,
    Coding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoutingDecision {
    Handle,
    Delegate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingResult {
    pub decision: RoutingDecision,
    pub target_model: Option<ModelRole>,
    pub confidence: f64,
    pub reason: String,
}

/// A fingerprint identifying a repeated tool call: the tool name plus a
/// normalized rendering of its arguments.
pub type ToolCallFingerprint = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecStep {
    pub name: String,
    pub state: TaskState,
}

/// The per-request working set the Task Executor's state machine operates
/// over. Created on request entry, discarded on `Completed`/`Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub trace_id: Uuid,
    pub session_id: Uuid,
    pub user_message: String,
    pub channel: String,
    pub mode: Mode,
    pub messages: Vec<Message>,
    pub tools_available: Vec<ToolDefinition>,
    pub selected_model_role: Option<ModelRole>,
    pub routing_history: Vec<RoutingResult>,
    pub steps: Vec<ExecStep>,
    pub metrics_summary: Option<MetricsSummary>,
    pub state: TaskState,
    pub tool_iterations: u32,
    pub repeated_tool_count: HashMap<ToolCallFingerprint, u32>,
    pub final_reply: Option<String>,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// Set when the final reply came from the deterministic fallback
    /// synthesiser (iteration/repeat cap hit, or the closing LLM call
    /// failed) rather than a model-produced synthesis turn.
    pub fallback_used: bool,
    /// Set when the request ended because its cancellation signal fired
    /// (client disconnect or server shutdown), not because of an upstream
    /// or internal failure.
    pub cancelled: bool,
}

impl ExecutionContext {
    pub fn new(
        trace_id: Uuid,
        session_id: Uuid,
        user_message: impl Into<String>,
        channel: impl Into<String>,
        mode: Mode,
    ) -> Self {
        Self {
            trace_id,
            session_id,
            user_message: user_message.into(),
            channel: channel.into(),
            mode,
            messages: Vec::new(),
            tools_available: Vec::new(),
            selected_model_role: None,
            routing_history: Vec::new(),
            steps: Vec::new(),
            metrics_summary: None,
            state: TaskState::Init,
            tool_iterations: 0,
            repeated_tool_count: HashMap::new(),
            final_reply: None,
            prompt_tokens: 0,
            completion_tokens: 0,
            fallback_used: false,
            cancelled: false,
        }
    }

    /// Accumulate token counts from one completion call's usage report, if
    /// the backend sent one.
    pub fn record_usage(&mut self, prompt_tokens: u32, completion_tokens: u32) {
        self.prompt_tokens += prompt_tokens;
        self.completion_tokens += completion_tokens;
    }

    pub fn record_step(&mut self, name: impl Into<String>) {
        let state = self.state;
        self.steps.push(ExecStep {
            name: name.into(),
            state,
        });
    }

    /// Record a tool-call fingerprint occurrence, returning the new count.
    pub fn record_fingerprint(&mut self, fingerprint: ToolCallFingerprint) -> u32 {
        let count = self.repeated_tool_count.entry(fingerprint).or_insert(0);
        *count += 1;
        *count
    }
}
