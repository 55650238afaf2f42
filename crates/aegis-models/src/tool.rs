//! Tool definition and result shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

/// A registered tool's static shape. Dynamically-discovered entries carry
/// the `mcp_` name prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    pub timeout_seconds: u64,
}

impl ToolDefinition {
    pub fn is_mcp(&self) -> bool {
        self.name.starts_with("mcp_")
    }
}

/// Result of a single tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub success: bool,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub error: Option<String>,
    pub latency_ms: u64,
    #[serde(default)]
    pub metadata: Value,
}

impl ToolResult {
    pub fn ok(tool_name: impl Into<String>, output: Value, latency_ms: u64) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            output,
            error: None,
            latency_ms,
            metadata: Value::Null,
        }
    }

    pub fn err(tool_name: impl Into<String>, error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: Value::Null,
            error: Some(error.into()),
            latency_ms,
            metadata: Value::Null,
        }
    }
}
