//! `Execute(name, args, trace_ctx) -> ToolResult`: lookup, governance check,
//! optional approval, argument validation, timeout-bounded invocation,
//! start/complete/fail telemetry. Mirrors the teacher's agent tool-call loop
//! (`restflow-ai/src/agent/executor/tool_exec.rs`), generalised to run
//! against the `GovernanceGate`/`ApprovalChannel` seams instead of the
//! teacher's in-process security gate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use aegis_models::{Mode, ToolDefinition, ToolResult};
use aegis_telemetry::TelemetryBus;
use aegis_traits::{ApprovalChannel, ApprovalOutcome, GovernanceGate, ToolAction};

use crate::registry::ToolRegistry;

pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    governance: Arc<dyn GovernanceGate>,
    approval: Arc<dyn ApprovalChannel>,
    telemetry: Arc<TelemetryBus>,
    approval_timeout_seconds: u64,
}

impl ToolExecutor {
    pub fn new(
        registry: Arc<ToolRegistry>,
        governance: Arc<dyn GovernanceGate>,
        approval: Arc<dyn ApprovalChannel>,
        telemetry: Arc<TelemetryBus>,
    ) -> Self {
        Self {
            registry,
            governance,
            approval,
            telemetry,
            approval_timeout_seconds: 60,
        }
    }

    pub fn with_approval_timeout_seconds(mut self, seconds: u64) -> Self {
        self.approval_timeout_seconds = seconds;
        self
    }

    pub async fn execute(
        &self,
        name: &str,
        arguments: Value,
        trace: &aegis_models::TraceContext,
        mode: Mode,
    ) -> ToolResult {
        let tool = match self.registry.lookup(name) {
            Some(tool) => tool,
            None => return ToolResult::err(name, "not found", 0),
        };

        let action = action_for(name, &arguments);

        let decision = match self.governance.check_action(&action, mode).await {
            Ok(decision) => decision,
            Err(err) => return ToolResult::err(name, err.to_string(), 0),
        };

        if decision.rate_limited {
            return ToolResult::err(
                name,
                decision.reason.unwrap_or_else(|| "rate limited".to_string()),
                0,
            );
        }

        if decision.requires_approval {
            match self
                .approval
                .request_approval(&action, decision.reason.as_deref(), self.approval_timeout_seconds)
                .await
            {
                Ok(ApprovalOutcome::Approved) => {}
                Ok(ApprovalOutcome::Denied) | Ok(ApprovalOutcome::TimedOut) => {
                    return ToolResult::err(name, "not approved", 0);
                }
                Err(err) => return ToolResult::err(name, err.to_string(), 0),
            }
        } else if !decision.allowed {
            return ToolResult::err(
                name,
                decision.reason.unwrap_or_else(|| "denied".to_string()),
                0,
            );
        }

        let definition = tool.definition();
        if let Err(message) = validate_arguments(&definition, &arguments) {
            return ToolResult::err(name, message, 0);
        }

        self.telemetry
            .begin(trace, "tool_call_started")
            .field("tool_name", name)
            .send(&self.telemetry)
            .await;

        let started = Instant::now();
        let timeout = Duration::from_secs(definition.timeout_seconds.max(1));
        let outcome = tokio::time::timeout(timeout, tool.execute(arguments)).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(result)) => {
                self.telemetry
                    .begin(trace, "tool_call_completed")
                    .field("tool_name", name)
                    .field("duration_ms", latency_ms as i64)
                    .send(&self.telemetry)
                    .await;
                result
            }
            Ok(Err(err)) => {
                let message = sanitize_error(&err.to_string());
                self.telemetry
                    .begin(trace, "tool_call_failed")
                    .field("tool_name", name)
                    .field("error", message.clone())
                    .send(&self.telemetry)
                    .await;
                ToolResult::err(name, message, latency_ms)
            }
            Err(_elapsed) => {
                self.telemetry
                    .begin(trace, "tool_call_failed")
                    .field("tool_name", name)
                    .field("error", "timeout")
                    .send(&self.telemetry)
                    .await;
                ToolResult::err(name, "timeout", latency_ms)
            }
        }
    }
}

/// Derives a `ToolAction` from a tool name and its arguments, for the
/// built-in tools whose targets are meaningful to path-based governance
/// policy. Unknown tools and MCP-gateway tools get an empty target; their
/// policy, if any, is keyed on `tool_name` alone.
fn action_for(name: &str, arguments: &Value) -> ToolAction {
    let target = match name {
        "read_file" | "list_directory" => arguments
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        _ => String::new(),
    };
    ToolAction::new(name, "execute", target)
}

/// Strips anything that looks like a filesystem path or stack frame from an
/// error message before it's emitted as telemetry or returned to the caller.
fn sanitize_error(message: &str) -> String {
    message
        .lines()
        .next()
        .unwrap_or(message)
        .chars()
        .take(500)
        .collect()
}

fn validate_arguments(definition: &ToolDefinition, arguments: &Value) -> Result<(), String> {
    let object = arguments
        .as_object()
        .ok_or_else(|| "arguments must be a JSON object".to_string())?;

    for param in &definition.parameters {
        let value = object.get(&param.name);
        match value {
            None => {
                if param.required {
                    return Err(format!("missing required argument '{}'", param.name));
                }
            }
            Some(value) => {
                if !matches_type(value, &param.param_type) {
                    return Err(format!(
                        "argument '{}' must be of type {}",
                        param.name, param.param_type
                    ));
                }
            }
        }
    }
    Ok(())
}

fn matches_type(value: &Value, param_type: &str) -> bool {
    match param_type {
        "string" => value.is_string(),
        "number" | "integer" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolRegistry;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl aegis_traits::Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".into(),
                description: "echoes input".into(),
                parameters: vec![aegis_models::ToolParameter {
                    name: "text".into(),
                    param_type: "string".into(),
                    required: true,
                    default: None,
                }],
                timeout_seconds: 5,
            }
        }

        async fn execute(&self, arguments: Value) -> aegis_traits::Result<ToolResult> {
            Ok(ToolResult::ok("echo", arguments, 1))
        }
    }

    struct AllowAllGate;

    #[async_trait]
    impl GovernanceGate for AllowAllGate {
        async fn check_action(
            &self,
            _action: &ToolAction,
            _mode: Mode,
        ) -> aegis_traits::Result<aegis_models::Decision> {
            Ok(aegis_models::Decision::allow())
        }

        async fn tool_allowed_in_mode(&self, _tool_name: &str, _mode: Mode) -> aegis_traits::Result<bool> {
            Ok(true)
        }
    }

    struct ApprovalRequiredGate;

    #[async_trait]
    impl GovernanceGate for ApprovalRequiredGate {
        async fn check_action(
            &self,
            _action: &ToolAction,
            _mode: Mode,
        ) -> aegis_traits::Result<aegis_models::Decision> {
            Ok(aegis_models::Decision::approval("writes require approval"))
        }

        async fn tool_allowed_in_mode(&self, _tool_name: &str, _mode: Mode) -> aegis_traits::Result<bool> {
            Ok(true)
        }
    }

    struct AutoApprove(ApprovalOutcome);

    #[async_trait]
    impl ApprovalChannel for AutoApprove {
        async fn request_approval(
            &self,
            _action: &ToolAction,
            _reason: Option<&str>,
            _timeout_seconds: u64,
        ) -> aegis_traits::Result<ApprovalOutcome> {
            Ok(self.0)
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn unknown_tool_returns_not_found() {
        let executor = ToolExecutor::new(
            registry(),
            Arc::new(AllowAllGate),
            Arc::new(AutoApprove(ApprovalOutcome::Approved)),
            Arc::new(TelemetryBus::new()),
        );
        let result = executor
            .execute(
                "missing",
                json!({}),
                &aegis_models::TraceContext::new(),
                Mode::Normal,
            )
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("not found"));
    }

    #[tokio::test]
    async fn missing_required_argument_fails_validation() {
        let executor = ToolExecutor::new(
            registry(),
            Arc::new(AllowAllGate),
            Arc::new(AutoApprove(ApprovalOutcome::Approved)),
            Arc::new(TelemetryBus::new()),
        );
        let result = executor
            .execute(
                "echo",
                json!({}),
                &aegis_models::TraceContext::new(),
                Mode::Normal,
            )
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("missing required argument"));
    }

    #[tokio::test]
    async fn successful_execution_returns_tool_result() {
        let executor = ToolExecutor::new(
            registry(),
            Arc::new(AllowAllGate),
            Arc::new(AutoApprove(ApprovalOutcome::Approved)),
            Arc::new(TelemetryBus::new()),
        );
        let result = executor
            .execute(
                "echo",
                json!({"text": "hi"}),
                &aegis_models::TraceContext::new(),
                Mode::Normal,
            )
            .await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn denied_approval_returns_not_approved() {
        let executor = ToolExecutor::new(
            registry(),
            Arc::new(ApprovalRequiredGate),
            Arc::new(AutoApprove(ApprovalOutcome::Denied)),
            Arc::new(TelemetryBus::new()),
        );
        let result = executor
            .execute(
                "echo",
                json!({"text": "hi"}),
                &aegis_models::TraceContext::new(),
                Mode::Normal,
            )
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("not approved"));
    }
}
