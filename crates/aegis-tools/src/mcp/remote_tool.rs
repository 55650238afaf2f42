//! Adapts a single MCP-discovered tool into an ordinary `Tool`, so the
//! registry and executor don't need to know a call is going out over a
//! subprocess gateway.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use aegis_models::{ToolDefinition, ToolResult};
use aegis_traits::{Result, Tool, ToolGateway};

pub struct RemoteTool {
    definition: ToolDefinition,
    gateway: Arc<dyn ToolGateway>,
}

impl RemoteTool {
    pub fn new(definition: ToolDefinition, gateway: Arc<dyn ToolGateway>) -> Self {
        Self { definition, gateway }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult> {
        match self.gateway.call_remote_tool(&self.definition.name, arguments).await {
            Ok(output) => Ok(ToolResult::ok(&self.definition.name, output, 0)),
            Err(err) => Ok(ToolResult::err(&self.definition.name, err.to_string(), 0)),
        }
    }
}

/// Discovers the gateway's tools and registers each as a `RemoteTool` under
/// its `mcp_`-prefixed name. Callers are expected to have already logged and
/// decided to continue with built-ins if `gateway.list_remote_tools` fails;
/// this function assumes the gateway is already up. Returns the registered
/// definitions so the caller can run each through governance auto-discovery.
pub async fn register_remote_tools(
    registry: &mut crate::registry::ToolRegistry,
    gateway: Arc<dyn ToolGateway>,
) -> Result<Vec<ToolDefinition>> {
    let definitions = gateway.list_remote_tools().await?;
    for definition in &definitions {
        registry.register(Arc::new(RemoteTool::new(definition.clone(), gateway.clone())));
    }
    Ok(definitions)
}
