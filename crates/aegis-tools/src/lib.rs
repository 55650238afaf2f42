//! Tool registry and executor (C5): registers built-in and MCP-discovered
//! tools, enforces governance before invocation, and runs executors under a
//! timeout on a bounded worker pool.

pub mod blocking_pool;
pub mod executor;
pub mod impls;
pub mod mcp;
pub mod path_policy;
pub mod registry;

pub use blocking_pool::BlockingPool;
pub use executor::ToolExecutor;
pub use impls::{LatestMetricsProvider, ListDirectoryTool, ReadFileTool, SearchWebTool, SystemMetricsTool};
pub use mcp::{register_remote_tools, RemoteTool, StdioMcpGateway};
pub use registry::ToolRegistry;
