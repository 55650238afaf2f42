//! `ToolRegistry`: `Register`/`Lookup`/`List`, the first three registry
//! operations named in the tool registry component. `List` is mode-aware —
//! it asks a `GovernanceGate` whether each tool is visible in the current
//! mode before handing the definition list to the LLM.

use std::collections::HashMap;
use std::sync::Arc;

use aegis_models::{Mode, ToolDefinition};
use aegis_traits::{GovernanceGate, Result, Tool};

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn all_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Definitions visible in `mode`, per the governance gate's cheap
    /// per-tool visibility check.
    pub async fn list(
        &self,
        mode: Mode,
        governance: &dyn GovernanceGate,
    ) -> Result<Vec<ToolDefinition>> {
        let mut visible = Vec::new();
        for tool in self.tools.values() {
            if governance.tool_allowed_in_mode(tool.name(), mode).await? {
                visible.push(tool.definition());
            }
        }
        Ok(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".into(),
                description: "echoes input".into(),
                parameters: vec![],
                timeout_seconds: 5,
            }
        }

        async fn execute(&self, arguments: Value) -> Result<aegis_models::ToolResult> {
            Ok(aegis_models::ToolResult::ok("echo", arguments, 0))
        }
    }

    struct AllowAllGate;

    #[async_trait]
    impl GovernanceGate for AllowAllGate {
        async fn check_action(
            &self,
            _action: &aegis_traits::ToolAction,
            _mode: Mode,
        ) -> Result<aegis_models::Decision> {
            Ok(aegis_models::Decision::allow())
        }

        async fn tool_allowed_in_mode(&self, _tool_name: &str, mode: Mode) -> Result<bool> {
            Ok(mode != Mode::Lockdown)
        }
    }

    #[test]
    fn register_then_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert!(registry.contains("echo"));
        assert!(registry.lookup("missing").is_none());
    }

    #[tokio::test]
    async fn list_filters_by_mode() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let gate = AllowAllGate;

        let normal = registry.list(Mode::Normal, &gate).await.unwrap();
        assert_eq!(normal.len(), 1);

        let lockdown = registry.list(Mode::Lockdown, &gate).await.unwrap();
        assert!(lockdown.is_empty());
    }

    #[test]
    fn json_args_roundtrip_through_echo_definition() {
        let registry_entry = EchoTool.definition();
        assert_eq!(registry_entry.name, "echo");
        let _ = json!({"x": 1});
    }
}
