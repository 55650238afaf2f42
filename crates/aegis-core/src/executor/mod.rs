//! The Task Executor (C7): drives a single request through
//! `Init -> LlmCall -> ToolExecution* -> Synthesis -> Completed/Failed`,
//! recording a `TimingSpan` for every effectful step and short-circuiting a
//! model stuck repeating the same tool call. Generalises the teacher's
//! `AgentNode` execution loop (`restflow-ai/src/agent/executor/mod.rs`)
//! from a workflow-graph node into the single chat-turn pipeline this
//! service exposes over HTTP.

pub mod compress;
pub mod context_window;
pub mod fingerprint;
pub mod synthesis;

use std::collections::HashMap;
use std::sync::Arc;

use aegis_models::{
    EventLevel, ExecutionContext, Message, ModelRole, Session, TaskState, ToolCall, TraceContext,
};
use aegis_telemetry::{Timer, TelemetryBus};
use aegis_tools::{ToolExecutor, ToolRegistry};
use aegis_traits::llm::{CompletionRequest, LlmClient};
use aegis_traits::SessionStore;
use tokio_util::sync::CancellationToken;

use crate::error::{AegisError, Result};
use crate::governance::GovernanceStore;
use crate::monitor::RequestMonitor;
use crate::sensor::SensorDaemon;
use context_window::ContextWindowConfig;

const SYSTEM_PROMPT: &str = "You are a locally-hosted assistant running on the user's own machine. \
Use the tools available to you when they would give a more accurate answer than your own \
knowledge, and say so plainly when you can't complete something.";

#[derive(Debug, Clone)]
pub struct TaskExecutorConfig {
    pub max_tool_iterations: u32,
    pub max_repeated_tool_calls: u32,
    pub context_window: ContextWindowConfig,
}

impl Default for TaskExecutorConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: 25,
            max_repeated_tool_calls: 3,
            context_window: ContextWindowConfig::default(),
        }
    }
}

pub struct TaskExecutor {
    governance: Arc<GovernanceStore>,
    tool_registry: Arc<ToolRegistry>,
    tool_executor: Arc<ToolExecutor>,
    llm_clients: HashMap<ModelRole, Arc<dyn LlmClient>>,
    router_config: aegis_llm::RouterConfig,
    router_llm: Option<Arc<dyn LlmClient>>,
    telemetry: TelemetryBus,
    config: TaskExecutorConfig,
    sensor: SensorDaemon,
    session_store: Arc<dyn SessionStore>,
}

impl TaskExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        governance: Arc<GovernanceStore>,
        tool_registry: Arc<ToolRegistry>,
        tool_executor: Arc<ToolExecutor>,
        llm_clients: HashMap<ModelRole, Arc<dyn LlmClient>>,
        router_config: aegis_llm::RouterConfig,
        router_llm: Option<Arc<dyn LlmClient>>,
        telemetry: TelemetryBus,
        config: TaskExecutorConfig,
        sensor: SensorDaemon,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            governance,
            tool_registry,
            tool_executor,
            llm_clients,
            router_config,
            router_llm,
            telemetry,
            config,
            sensor,
            session_store,
        }
    }

    /// Run one request to completion and persist the resulting transcript
    /// onto `session` before returning it alongside the execution context.
    /// `session.messages` on entry is the prior transcript (already
    /// excludes the new user turn, already compressed if the caller asked
    /// for that); `mode` is the live process-wide mode at request start,
    /// independent of whatever mode was last stamped onto the session.
    /// `cancellation` fires on client disconnect or server shutdown; the
    /// request still persists whatever transcript it produced and still
    /// emits its trace, same as any other `Failed` outcome.
    pub async fn run(
        &self,
        trace: &TraceContext,
        mut session: Session,
        user_message: &str,
        mode: aegis_models::Mode,
        cancellation: CancellationToken,
    ) -> (ExecutionContext, Session) {
        let history = session.messages.clone();
        let mut ctx = ExecutionContext::new(trace.trace_id, session.session_id, user_message, &session.channel, mode);
        let mut timer = Timer::new();
        let monitor = RequestMonitor::start(&self.sensor);

        let setup = timer.start("setup");
        ctx.messages = self.build_messages(history, user_message);
        ctx.tools_available = self
            .tool_registry
            .list(mode, self.governance.as_ref())
            .await
            .unwrap_or_default();
        timer.end(setup);

        let routing = timer.start("routing");
        let route_result = aegis_llm::route(
            user_message,
            &session.channel,
            &self.router_config,
            self.router_llm.as_deref(),
        )
        .await;
        timer.end(routing);

        let role = match route_result {
            Ok(result) => {
                let role = result.target_model.unwrap_or(ModelRole::Standard);
                ctx.routing_history.push(result);
                role
            }
            Err(_) => ModelRole::Standard,
        };
        ctx.selected_model_role = Some(role);

        ctx.state = TaskState::LlmCall;
        ctx.record_step("initial_llm_call");

        let outcome = self
            .drive_tool_loop(&mut ctx, &mut timer, trace, role, &cancellation)
            .await;

        match outcome {
            Ok(()) => {
                ctx.state = TaskState::Completed;
            }
            Err(AegisError::Cancelled) => {
                ctx.cancelled = true;
                ctx.record_step("cancelled");
                ctx.state = TaskState::Failed;
                self.telemetry
                    .begin(trace, "request_cancelled")
                    .level(EventLevel::Warn)
                    .field("tool_iterations", ctx.tool_iterations as i64)
                    .send(&self.telemetry)
                    .await;
            }
            Err(err) => {
                if ctx.final_reply.is_none() {
                    ctx.final_reply = Some(synthesis::synthesize_from_transcript(&ctx.messages));
                    ctx.fallback_used = true;
                }
                ctx.record_step(format!("failed: {err}"));
                ctx.state = TaskState::Failed;
            }
        }

        let persistence = timer.start("persistence");
        session.mode = mode;
        session.messages = ctx.messages.clone();
        if let Err(err) = self.session_store.save(&session).await {
            tracing::warn!(error = %err, "failed to persist session after request");
        }
        timer.end(persistence);

        ctx.metrics_summary = Some(monitor.stop(mode, self.governance.as_ref()));
        self.emit_request_trace(&ctx, &timer).await;
        (ctx, session)
    }

    fn build_messages(&self, mut history: Vec<Message>, user_message: &str) -> Vec<Message> {
        if history.first().map(|m| m.role) != Some(aegis_models::Role::System) {
            history.insert(0, Message::system(SYSTEM_PROMPT));
        }
        history.push(Message::user(user_message));
        context_window::truncate(&history, &self.config.context_window)
    }

    /// The `LlmCall <-> ToolExecution` cycle, bounded by
    /// `max_tool_iterations`. Returns `Ok(())` once a final textual reply
    /// is produced (normally or via the fallback synthesiser), `Err(
    /// Cancelled)` the moment `cancellation` fires mid-call, and any other
    /// error only when neither path could produce a reply.
    async fn drive_tool_loop(
        &self,
        ctx: &mut ExecutionContext,
        timer: &mut Timer,
        trace: &TraceContext,
        role: ModelRole,
        cancellation: &CancellationToken,
    ) -> Result<()> {
        loop {
            if cancellation.is_cancelled() {
                return Err(AegisError::Cancelled);
            }

            let client = self
                .llm_clients
                .get(&role)
                .or_else(|| self.llm_clients.get(&ModelRole::Standard))
                .ok_or_else(|| AegisError::Internal("no llm client configured for role".to_string()))?;

            let request = CompletionRequest::new(ctx.messages.clone()).with_tools(ctx.tools_available.clone());

            let span = timer.start(format!("llm_call:{role:?}").to_lowercase());
            let response = tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    timer.end(span);
                    return Err(AegisError::Cancelled);
                }
                result = client.complete(request) => result,
            };
            timer.end(span);

            let response = match response {
                Ok(response) => response,
                Err(err) => {
                    if ctx.messages.iter().any(|m| m.role == aegis_models::Role::Tool) {
                        let span = timer.start("synthesis");
                        ctx.final_reply = Some(synthesis::synthesize_from_transcript(&ctx.messages));
                        ctx.fallback_used = true;
                        timer.end(span);
                        return Ok(());
                    }
                    return Err(AegisError::UpstreamUnavailable(err.to_string()));
                }
            };

            if let Some(usage) = response.usage.as_ref() {
                ctx.record_usage(usage.prompt_tokens, usage.completion_tokens);
            }

            if response.tool_calls.is_empty() {
                let span = timer.start("synthesis");
                ctx.state = TaskState::Synthesis;
                ctx.record_step("synthesis");
                ctx.final_reply = Some(response.content.unwrap_or_default());
                timer.end(span);
                return Ok(());
            }

            ctx.state = TaskState::ToolExecution;
            ctx.messages.push(Message::assistant_with_tool_calls(
                response.content.unwrap_or_default(),
                response.tool_calls.clone(),
            ));

            let repeated = tokio::select! {
                biased;
                _ = cancellation.cancelled() => return Err(AegisError::Cancelled),
                result = self.execute_tool_calls(ctx, timer, trace, &response.tool_calls) => result,
            };
            if repeated {
                ctx.state = TaskState::Synthesis;
                ctx.record_step("repeated_tool_call_short_circuit");
                let span = timer.start("synthesis");
                ctx.final_reply = Some(synthesis::synthesize_from_transcript(&ctx.messages));
                ctx.fallback_used = true;
                timer.end(span);
                return Ok(());
            }

            ctx.tool_iterations += 1;
            if ctx.tool_iterations >= self.config.max_tool_iterations {
                ctx.record_step("max_tool_iterations_reached");
                let span = timer.start("synthesis");
                ctx.final_reply = Some(synthesis::synthesize_from_transcript(&ctx.messages));
                ctx.fallback_used = true;
                timer.end(span);
                return Ok(());
            }

            ctx.state = TaskState::LlmCall;
            ctx.record_step("follow_up_llm_call");
        }
    }

    /// Executes every tool call in one assistant turn, short-circuiting the
    /// remainder (and reporting `true`) the moment a fingerprint exceeds
    /// `max_repeated_tool_calls` — the model is stuck, so the caller jumps
    /// straight to synthesis instead of feeding it another identical result.
    async fn execute_tool_calls(
        &self,
        ctx: &mut ExecutionContext,
        timer: &mut Timer,
        trace: &TraceContext,
        calls: &[ToolCall],
    ) -> bool {
        for call in calls {
            let fp = fingerprint::fingerprint(&call.name, &call.arguments);
            let count = ctx.record_fingerprint(fp);

            if count > self.config.max_repeated_tool_calls {
                self.telemetry
                    .begin(trace, "repeated_tool_call_suppressed")
                    .level(EventLevel::Warn)
                    .field("tool_name", call.name.clone())
                    .send(&self.telemetry)
                    .await;
                ctx.messages.push(Message::tool_result(
                    call.id.clone(),
                    "this exact call has already been made several times this request; \
                     try a different approach instead of repeating it",
                ));
                return true;
            }

            let span = timer.start(format!("tool_execution:{}", call.name));
            let result = self
                .tool_executor
                .execute(&call.name, call.arguments.clone(), trace, ctx.mode)
                .await;
            timer.end(span);

            let content = if result.success {
                serde_json::to_string(&result.output).unwrap_or_default()
            } else {
                format!("error: {}", result.error.unwrap_or_default())
            };
            ctx.messages.push(Message::tool_result(call.id.clone(), content));
        }
        false
    }

    /// Emits the `request_trace` summary plus one `request_trace_step` per
    /// closed `TimingSpan`. Both carry `trace_id`/`sequence` fields so a
    /// search-index sink can derive the idempotent document ids
    /// (`trace_{trace_id}` / `trace_{trace_id}_step_{sequence}`) named in
    /// the search-index sink interface without the bus needing to know
    /// about that sink's document model.
    async fn emit_request_trace(&self, ctx: &ExecutionContext, timer: &Timer) {
        let trace = TraceContext { trace_id: ctx.trace_id, parent_span_id: None };
        self.telemetry
            .begin(&trace, "request_trace")
            .level(if ctx.state == TaskState::Failed {
                EventLevel::Error
            } else {
                EventLevel::Info
            })
            .field("state", format!("{:?}", ctx.state))
            .field("tool_iterations", ctx.tool_iterations as i64)
            .field("total_ms", timer.total_elapsed_ms() as i64)
            .field("fallback_used", ctx.fallback_used)
            .send(&self.telemetry)
            .await;

        for span in timer.to_breakdown() {
            self.telemetry
                .begin(&trace, "request_trace_step")
                .level(EventLevel::Info)
                .field("sequence", span.sequence as i64)
                .field("name", span.name.clone())
                .field("phase", format!("{:?}", span.phase))
                .field("offset_ms", span.offset_ms as i64)
                .field("duration_ms", span.duration_ms as i64)
                .send(&self.telemetry)
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_llm::{MockLlmClient, MockStep, RouterConfig};
    use aegis_models::RiskLevel;
    use aegis_traits::{ApprovalChannel, ApprovalOutcome, GovernanceGate};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[derive(Default)]
    struct InMemorySessionStore(Mutex<HashMap<uuid::Uuid, Session>>);

    #[async_trait]
    impl SessionStore for InMemorySessionStore {
        async fn load(&self, session_id: uuid::Uuid) -> aegis_traits::Result<Option<Session>> {
            Ok(self.0.lock().get(&session_id).cloned())
        }
        async fn save(&self, session: &Session) -> aegis_traits::Result<()> {
            self.0.lock().insert(session.session_id, session.clone());
            Ok(())
        }
        async fn delete(&self, session_id: uuid::Uuid) -> aegis_traits::Result<()> {
            self.0.lock().remove(&session_id);
            Ok(())
        }
        async fn list_recent(&self, _limit: usize) -> aegis_traits::Result<Vec<Session>> {
            Ok(self.0.lock().values().cloned().collect())
        }
    }

    struct AutoApprove;
    #[async_trait]
    impl ApprovalChannel for AutoApprove {
        async fn request_approval(
            &self,
            _action: &aegis_traits::ToolAction,
            _reason: Option<&str>,
            _timeout_seconds: u64,
        ) -> aegis_traits::Result<ApprovalOutcome> {
            Ok(ApprovalOutcome::Approved)
        }
    }

    struct EchoTool;
    #[async_trait]
    impl aegis_traits::Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn definition(&self) -> aegis_models::ToolDefinition {
            aegis_models::ToolDefinition {
                name: "echo".into(),
                description: "echoes".into(),
                parameters: vec![],
                timeout_seconds: 5,
            }
        }
        async fn execute(&self, arguments: serde_json::Value) -> aegis_traits::Result<aegis_models::ToolResult> {
            Ok(aegis_models::ToolResult::ok("echo", arguments, 1))
        }
    }

    fn governance_allow_all() -> Arc<GovernanceStore> {
        let mut modes = BTreeSet::new();
        modes.insert(aegis_models::Mode::Normal);
        let mut policies = HashMap::new();
        policies.insert(
            "echo".to_string(),
            aegis_models::ToolPolicy {
                name: "echo".into(),
                category: "test".into(),
                risk_level: RiskLevel::Low,
                allowed_in_modes: modes,
                requires_approval: false,
                forbidden_paths: vec![],
                allowed_paths: vec![],
                timeout_seconds: 5,
                rate_limit: None,
            },
        );
        Arc::new(GovernanceStore::new(HashMap::new(), policies))
    }

    fn executor_with_store(client: MockLlmClient, session_store: Arc<dyn SessionStore>) -> TaskExecutor {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let registry = Arc::new(registry);
        let governance = governance_allow_all();

        let tool_executor = Arc::new(ToolExecutor::new(
            registry.clone(),
            governance.clone(),
            Arc::new(AutoApprove),
            Arc::new(TelemetryBus::new()),
        ));

        let mut clients: HashMap<ModelRole, Arc<dyn LlmClient>> = HashMap::new();
        let client: Arc<dyn LlmClient> = Arc::new(client);
        clients.insert(ModelRole::Standard, client.clone());
        clients.insert(ModelRole::Coding, client.clone());
        clients.insert(ModelRole::Reasoning, client);

        TaskExecutor::new(
            governance,
            registry,
            tool_executor,
            clients,
            RouterConfig::default(),
            None,
            TelemetryBus::new(),
            TaskExecutorConfig::default(),
            crate::sensor::SensorDaemon::new(Default::default(), TelemetryBus::new()),
            session_store,
        )
    }

    fn executor_with(client: MockLlmClient) -> TaskExecutor {
        executor_with_store(client, Arc::new(InMemorySessionStore::default()))
    }

    fn executor_with_telemetry(client: MockLlmClient, telemetry: TelemetryBus) -> TaskExecutor {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let registry = Arc::new(registry);
        let governance = governance_allow_all();

        let tool_executor = Arc::new(ToolExecutor::new(
            registry.clone(),
            governance.clone(),
            Arc::new(AutoApprove),
            Arc::new(TelemetryBus::new()),
        ));

        let mut clients: HashMap<ModelRole, Arc<dyn LlmClient>> = HashMap::new();
        let client: Arc<dyn LlmClient> = Arc::new(client);
        clients.insert(ModelRole::Standard, client.clone());
        clients.insert(ModelRole::Coding, client.clone());
        clients.insert(ModelRole::Reasoning, client);

        TaskExecutor::new(
            governance,
            registry,
            tool_executor,
            clients,
            RouterConfig::default(),
            None,
            telemetry,
            TaskExecutorConfig::default(),
            crate::sensor::SensorDaemon::new(Default::default(), TelemetryBus::new()),
            Arc::new(InMemorySessionStore::default()),
        )
    }

    fn new_session() -> Session {
        Session::new("CHAT", aegis_models::Mode::Normal)
    }

    #[tokio::test]
    async fn simple_greeting_completes_without_tools() {
        let client = MockLlmClient::from_steps("mock", vec![MockStep::text("hello there")]);
        let executor = executor_with(client);
        let (ctx, _session) = executor
            .run(&TraceContext::new(), new_session(), "hi", aegis_models::Mode::Normal, CancellationToken::new())
            .await;
        assert_eq!(ctx.state, TaskState::Completed);
        assert_eq!(ctx.final_reply.as_deref(), Some("hello there"));
    }

    #[tokio::test]
    async fn greeting_trace_includes_synthesis_phase() {
        use aegis_telemetry::sink::RecordingSink;

        let sink = Arc::new(RecordingSink::new());
        let telemetry = TelemetryBus::new().with_sink(sink.clone());
        let client = MockLlmClient::from_steps("mock", vec![MockStep::text("hello there")]);
        let executor = executor_with_telemetry(client, telemetry);

        let (ctx, _session) = executor
            .run(&TraceContext::new(), new_session(), "hi", aegis_models::Mode::Normal, CancellationToken::new())
            .await;
        assert_eq!(ctx.state, TaskState::Completed);

        let events = sink.events().await;
        let has_synthesis_step = events.iter().any(|e| {
            e.event_name == "request_trace_step"
                && e.fields.get("phase").and_then(|v| v.as_str()) == Some("Synthesis")
        });
        assert!(has_synthesis_step, "expected a request_trace_step with phase=Synthesis");
    }

    #[tokio::test]
    async fn tool_call_then_text_completes() {
        let client = MockLlmClient::from_steps(
            "mock",
            vec![
                MockStep::tool_call("1", "echo", json!({"value": 1})),
                MockStep::text("done"),
            ],
        );
        let executor = executor_with(client);
        let (ctx, _session) = executor
            .run(&TraceContext::new(), new_session(), "echo something", aegis_models::Mode::Normal, CancellationToken::new())
            .await;
        assert_eq!(ctx.state, TaskState::Completed);
        assert_eq!(ctx.tool_iterations, 1);
        assert!(ctx.messages.iter().any(|m| m.role == aegis_models::Role::Tool));
    }

    #[tokio::test]
    async fn repeated_identical_tool_call_is_suppressed() {
        // The model would keep issuing the same call forever; only the
        // first `max_repeated_tool_calls` get a real attempt before the
        // executor short-circuits straight to a fallback synthesis.
        let steps = (0..6)
            .map(|_| MockStep::tool_call("1", "echo", json!({"value": 1})))
            .collect();
        let client = MockLlmClient::from_steps("mock", steps);
        let mut executor = executor_with(client);
        executor.config.max_tool_iterations = 10;
        executor.config.max_repeated_tool_calls = 2;

        let (ctx, _session) = executor
            .run(&TraceContext::new(), new_session(), "echo repeatedly", aegis_models::Mode::Normal, CancellationToken::new())
            .await;

        assert_eq!(ctx.state, TaskState::Completed);
        assert!(ctx.fallback_used);
        assert!(ctx
            .messages
            .iter()
            .any(|m| m.content.contains("already been made several times")));
    }

    #[tokio::test]
    async fn llm_failure_with_prior_tool_output_falls_back_to_synthesis() {
        let client = MockLlmClient::from_steps(
            "mock",
            vec![
                MockStep::tool_call("1", "echo", json!({"value": 1})),
                MockStep::error("upstream down"),
            ],
        );
        let executor = executor_with(client);
        let (ctx, _session) = executor
            .run(&TraceContext::new(), new_session(), "echo something", aegis_models::Mode::Normal, CancellationToken::new())
            .await;
        assert_eq!(ctx.state, TaskState::Completed);
        assert!(ctx.fallback_used);
        assert!(ctx.final_reply.unwrap().contains("couldn't reach"));
    }

    #[tokio::test]
    async fn llm_failure_with_no_tool_output_fails() {
        let client = MockLlmClient::from_steps("mock", vec![MockStep::error("upstream down")]);
        let executor = executor_with(client);
        let (ctx, _session) = executor
            .run(&TraceContext::new(), new_session(), "hi", aegis_models::Mode::Normal, CancellationToken::new())
            .await;
        assert_eq!(ctx.state, TaskState::Failed);
    }

    #[tokio::test]
    async fn completed_request_persists_session_transcript() {
        let client = MockLlmClient::from_steps("mock", vec![MockStep::text("hello there")]);
        let session_store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::default());
        let executor = executor_with_store(client, session_store.clone());
        let session = new_session();
        let session_id = session.session_id;

        let (_ctx, returned) = executor
            .run(&TraceContext::new(), session, "hi", aegis_models::Mode::Normal, CancellationToken::new())
            .await;
        assert_eq!(returned.session_id, session_id);

        let stored = session_store.load(session_id).await.unwrap().unwrap();
        assert!(stored.messages.iter().any(|m| m.content == "hi"));
        assert!(stored.messages.iter().any(|m| m.content == "hello there"));
    }

    #[tokio::test]
    async fn pre_cancelled_token_fails_the_request_as_cancelled() {
        let client = MockLlmClient::from_steps("mock", vec![MockStep::text("hello there")]);
        let executor = executor_with(client);
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let (ctx, _session) = executor
            .run(&TraceContext::new(), new_session(), "hi", aegis_models::Mode::Normal, cancellation)
            .await;

        assert_eq!(ctx.state, TaskState::Failed);
        assert!(ctx.cancelled);
    }
}
