//! The Governance gate: every tool call the Task Executor wants to make is
//! checked here before it runs, against the active `Mode` and the loaded
//! `ToolPolicy` set.

use async_trait::async_trait;

use aegis_models::{Decision, Mode};

use crate::error::Result;

/// A concrete tool invocation under consideration, normalized enough that a
/// path-based policy (forbidden/allowed globs) can be evaluated against it.
#[derive(Debug, Clone)]
pub struct ToolAction {
    pub tool_name: String,
    pub operation: String,
    pub target: String,
}

impl ToolAction {
    pub fn new(
        tool_name: impl Into<String>,
        operation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            operation: operation.into(),
            target: target.into(),
        }
    }

    pub fn as_pattern_string(&self) -> String {
        format!("{}:{} {}", self.tool_name, self.operation, self.target)
    }
}

/// Evaluates tool actions against policy and current mode, and routes
/// approval-gated actions to an `ApprovalChannel`.
#[async_trait]
pub trait GovernanceGate: Send + Sync {
    async fn check_action(&self, action: &ToolAction, mode: Mode) -> Result<Decision>;

    /// Cheap check a caller can run before building a full `ToolAction`,
    /// e.g. to hide a tool from the LLM's tool list entirely.
    async fn tool_allowed_in_mode(&self, tool_name: &str, mode: Mode) -> Result<bool>;
}
