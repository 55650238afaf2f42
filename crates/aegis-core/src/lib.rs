//! The aegis agent core: wires the Orchestrator-Brainstem-Governance triad
//! (C1-C10) into one `AppCore` handle shared by the HTTP surface and the
//! CLI's in-process mode. Follows the teacher's `AppCore` shape
//! (`restflow-core/src/lib.rs`): one struct built once at startup, handed
//! around as an `Arc`, background daemons spawned as their own tasks off a
//! shared shutdown broadcast.

pub mod adapters;
pub mod approval;
pub mod config;
pub mod error;
pub mod executor;
pub mod governance;
pub mod http;
pub mod mode;
pub mod monitor;
pub mod scheduler;
pub mod sensor;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

use aegis_models::{ComponentHealth, ModelRole};
use aegis_storage::{LocalSessionStore, MetricsHistoryStore, ReflectionStore};
use aegis_telemetry::{JsonlSink, TelemetryBus};
use aegis_tools::{
    BlockingPool, LatestMetricsProvider, ListDirectoryTool, ReadFileTool, SearchWebTool,
    SystemMetricsTool, ToolExecutor, ToolRegistry,
};
use aegis_traits::llm::LlmClient;

use crate::approval::ConsoleApprovalChannel;
use crate::config::AppConfig;
use crate::executor::{TaskExecutor, TaskExecutorConfig};
use crate::governance::GovernanceStore;
use crate::mode::ModeManager;
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::sensor::{SensorConfig, SensorDaemon};

const DEFAULT_BLOCKING_POOL_CAPACITY: usize = 8;
const FILE_TOOL_BASE_DIR_ENV: &str = "HOME";

struct SensorMetricsProvider(SensorDaemon);

impl LatestMetricsProvider for SensorMetricsProvider {
    fn latest(&self) -> Option<aegis_models::MetricSnapshot> {
        self.0.latest()
    }
}

/// Shared application state: every collaborator named in the component
/// breakdown, built once and handed out as an `Arc<AppCore>`.
pub struct AppCore {
    pub config: AppConfig,
    pub governance: Arc<GovernanceStore>,
    pub sensor: SensorDaemon,
    pub mode_manager: Arc<ModeManager>,
    pub tool_registry: Arc<ToolRegistry>,
    pub tool_executor: Arc<ToolExecutor>,
    pub task_executor: Arc<TaskExecutor>,
    pub session_store: Arc<LocalSessionStore>,
    pub reflection_store: Arc<ReflectionStore>,
    pub metrics_history: Arc<MetricsHistoryStore>,
    pub telemetry: TelemetryBus,
    pub llm_clients: HashMap<ModelRole, Arc<dyn LlmClient>>,
    /// Cancelled once the process starts shutting down; every in-flight
    /// request derives a child token from this so its execution can be cut
    /// short instead of outliving the HTTP server's graceful-shutdown grace
    /// period. See `executor::TaskExecutor::run`.
    pub shutdown_token: CancellationToken,
}

impl AppCore {
    /// Build every collaborator and wire them together. Does not start any
    /// background task; callers spawn `spawn_background_tasks` separately
    /// once they hold the shutdown broadcast sender they want to use.
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let telemetry_dir = config.resolved_telemetry_dir();
        tokio::fs::create_dir_all(&telemetry_dir).await?;
        let jsonl_path = telemetry_dir.join("events.jsonl");
        let sink = JsonlSink::new(jsonl_path, 64 * 1024 * 1024, 5).await?;
        let mut telemetry = TelemetryBus::new();
        telemetry.add_sink(sink);

        let policy_path = config.resolved_policy_path();
        let governance = Arc::new(GovernanceStore::load(&policy_path).await?);

        let sensor = SensorDaemon::new(
            SensorConfig {
                poll_interval: config.metrics_poll_interval,
                ..SensorConfig::default()
            },
            telemetry.clone(),
        );

        let mode_manager = Arc::new(ModeManager::new(telemetry.clone()));

        let aegis_dir = aegis_storage::ensure_aegis_dir().await?;
        let session_store = Arc::new(LocalSessionStore::open(&aegis_dir).await?);
        let reflection_store = Arc::new(ReflectionStore::open(&aegis_dir).await?);
        let metrics_history = Arc::new(MetricsHistoryStore::open(&aegis_dir).await?);

        let tool_registry = Self::build_tool_registry(&config, &sensor, &governance).await;
        let tool_registry = Arc::new(tool_registry);

        let approval = Arc::new(ConsoleApprovalChannel);
        let tool_executor = Arc::new(ToolExecutor::new(
            tool_registry.clone(),
            governance.clone(),
            approval,
            Arc::new(telemetry.clone()),
        ));

        let llm_clients = Self::build_llm_clients(&config);

        let router_config = aegis_llm::RouterConfig {
            confidence_threshold: config.router.confidence_threshold,
            llm_timeout_ms: config.router.timeout_seconds * 1000,
            ..aegis_llm::RouterConfig::default()
        };
        let router_llm = llm_clients.get(&ModelRole::Router).cloned();

        let task_executor = Arc::new(TaskExecutor::new(
            governance.clone(),
            tool_registry.clone(),
            tool_executor.clone(),
            llm_clients.clone(),
            router_config,
            router_llm,
            telemetry.clone(),
            TaskExecutorConfig {
                max_tool_iterations: config.executor.max_tool_iterations,
                max_repeated_tool_calls: config.executor.max_repeated_tool_calls,
                ..TaskExecutorConfig::default()
            },
            sensor.clone(),
            session_store.clone(),
        ));

        Ok(Self {
            config,
            governance,
            sensor,
            mode_manager,
            tool_registry,
            tool_executor,
            task_executor,
            session_store,
            reflection_store,
            metrics_history,
            telemetry,
            llm_clients,
            shutdown_token: CancellationToken::new(),
        })
    }

    async fn build_tool_registry(
        config: &AppConfig,
        sensor: &SensorDaemon,
        governance: &Arc<GovernanceStore>,
    ) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        let pool = BlockingPool::new(DEFAULT_BLOCKING_POOL_CAPACITY);
        let base_dir = std::env::var(FILE_TOOL_BASE_DIR_ENV)
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());

        registry.register(Arc::new(ReadFileTool::new(base_dir.clone(), pool.clone())));
        registry.register(Arc::new(ListDirectoryTool::new(base_dir, pool)));
        registry.register(Arc::new(SearchWebTool));
        registry.register(Arc::new(SystemMetricsTool::new(SensorMetricsProvider(
            sensor.clone(),
        ))));

        if config.mcp_gateway.enabled {
            if let Some((command, args)) = config.mcp_gateway.command.split_first() {
                match aegis_tools::StdioMcpGateway::start(command, args).await {
                    Ok(gateway) => {
                        let gateway: Arc<dyn aegis_traits::ToolGateway> = Arc::new(gateway);
                        match aegis_tools::register_remote_tools(&mut registry, gateway).await {
                            Ok(definitions) => {
                                info!(count = definitions.len(), "registered MCP tools");
                                for definition in &definitions {
                                    governance
                                        .ensure_tool_configured(crate::governance::discover_policy(
                                            &definition.name,
                                            "mcp",
                                            &definition.description,
                                        ))
                                        .await;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "failed to list MCP tools, continuing with built-ins")
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to start MCP gateway, continuing with built-ins")
                    }
                }
            } else {
                tracing::warn!("AGENT_MCP_GATEWAY_ENABLED set but no command configured");
            }
        }

        registry
    }

    fn build_llm_clients(config: &AppConfig) -> HashMap<ModelRole, Arc<dyn LlmClient>> {
        let mut clients: HashMap<ModelRole, Arc<dyn LlmClient>> = HashMap::new();

        let make = |model: &str| -> Arc<dyn LlmClient> {
            match &config.llm_base_url {
                Some(base_url) => {
                    let inner = aegis_llm::OpenAiCompatClient::new(model).with_base_url(base_url.clone());
                    Arc::new(aegis_llm::RetryingLlmClient::with_default_config(Arc::new(inner)))
                }
                None => Arc::new(aegis_llm::MockLlmClient::new(model)),
            }
        };

        clients.insert(ModelRole::Router, make("aegis-router"));
        clients.insert(ModelRole::Standard, make("aegis-standard"));
        clients.insert(ModelRole::Reasoning, make("aegis-reasoning"));
        clients.insert(ModelRole::Coding, make("aegis-coding"));
        clients
    }

    /// Spawn the Sensor Daemon and Scheduler as background tasks, both
    /// cancelled by the same shutdown broadcast the HTTP server listens on.
    pub fn spawn_background_tasks(self: &Arc<Self>, shutdown: &broadcast::Sender<()>) {
        let sensor = self.sensor.clone();
        let sensor_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            sensor.run(sensor_shutdown).await;
        });

        let shutdown_token = self.shutdown_token.clone();
        let mut token_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = token_shutdown.recv().await;
            shutdown_token.cancel();
        });

        let scheduler = Arc::new(Scheduler::new(
            Arc::new(self.sensor.clone()),
            self.governance.clone(),
            self.telemetry.clone(),
            self.session_store.clone(),
            self.reflection_store.clone(),
            self.metrics_history.clone(),
            SchedulerConfig {
                session_retention_days: self.config.retention.hot_days,
                ..SchedulerConfig::default()
            },
        ));
        self.mode_manager.set_scheduler(scheduler.clone());

        let scheduler_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            scheduler.run(scheduler_shutdown).await;
        });
    }

    /// Component statuses for `GET /health`.
    pub async fn health(&self) -> Vec<ComponentHealth> {
        let mut statuses = Vec::new();

        statuses.push(match self.sensor.latest() {
            Some(_) => ComponentHealth::ok("sensor_daemon"),
            None => ComponentHealth::unhealthy("sensor_daemon", "no samples collected yet"),
        });

        statuses.push(ComponentHealth::ok("mode_manager"));

        statuses.push(if self.tool_registry.is_empty() {
            ComponentHealth::unhealthy("tool_registry", "no tools registered")
        } else {
            ComponentHealth::ok("tool_registry")
        });

        statuses.push(if self.llm_clients.is_empty() {
            ComponentHealth::unhealthy("llm_clients", "no model backends configured")
        } else {
            ComponentHealth::ok("llm_clients")
        });

        statuses.push(match self.session_store.recent(1).await {
            Ok(_) => ComponentHealth::ok("session_store"),
            Err(err) => ComponentHealth::unhealthy("session_store", err.to_string()),
        });

        statuses
    }
}

pub use error::{AegisError, Result as AegisResult};
