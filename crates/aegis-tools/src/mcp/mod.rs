pub mod protocol;
pub mod remote_tool;
pub mod stdio_gateway;

pub use remote_tool::{register_remote_tools, RemoteTool};
pub use stdio_gateway::StdioMcpGateway;
