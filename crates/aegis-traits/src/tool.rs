//! The `Tool` trait: the seam between the Task Executor's tool-call loop and
//! any concrete capability (filesystem read, metrics snapshot, web search,
//! an MCP-gateway-backed remote tool).

use async_trait::async_trait;
use serde_json::Value;

use aegis_models::{ToolDefinition, ToolResult};

use crate::error::Result;

/// A single invocable capability. Implementors own their own side effects;
/// the registry only knows how to look one up by name and hand it input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used in LLM tool-call payloads and in policy lookups.
    fn name(&self) -> &str;

    fn definition(&self) -> ToolDefinition;

    /// Execute with validated JSON arguments. Implementors should not panic
    /// on malformed input; return a failed `ToolResult` instead.
    async fn execute(&self, arguments: Value) -> Result<ToolResult>;
}
