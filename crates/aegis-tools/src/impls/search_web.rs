//! `search_web`: stubbed until a real search backend is wired in. Returns a
//! successful, clearly-labelled "not configured" result rather than an
//! error, so the registry shape and routing heuristics (which key off tool
//! intent keywords like "search web") stay real without requiring a live
//! network collaborator in tests.

use async_trait::async_trait;
use serde_json::{json, Value};

use aegis_models::{ToolDefinition, ToolParameter, ToolResult};
use aegis_traits::{Result, Tool};

pub struct SearchWebTool;

#[async_trait]
impl Tool for SearchWebTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_web".into(),
            description: "Searches the web (not configured in this deployment)".into(),
            parameters: vec![ToolParameter {
                name: "query".into(),
                param_type: "string".into(),
                required: true,
                default: None,
            }],
            timeout_seconds: 10,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolResult> {
        Ok(ToolResult::ok(
            "search_web",
            json!({"status": "not configured", "results": []}),
            0,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn reports_not_configured_without_erroring() {
        let tool = SearchWebTool;
        let result = tool.execute(json!({"query": "rust async traits"})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output["status"], "not configured");
    }
}
