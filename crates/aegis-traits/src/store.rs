//! Collaborator storage traits for the optional, local-first integrations
//! named in C10: session persistence, a personal knowledge graph, a search
//! index sink, and a gateway to MCP-hosted remote tools. Everything here is
//! optional at runtime — aegis-core degrades to in-memory session state and
//! a no-op search sink when these aren't configured.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use aegis_models::{Session, TelemetryEvent};

use crate::error::Result;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: Uuid) -> Result<Option<Session>>;
    async fn save(&self, session: &Session) -> Result<()>;
    async fn delete(&self, session_id: Uuid) -> Result<()>;
    async fn list_recent(&self, limit: usize) -> Result<Vec<Session>>;
}

/// A small local knowledge-graph store: nodes and edges keyed by opaque
/// string ids, values left as JSON so the graph schema can evolve without
/// touching this trait.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn upsert_node(&self, id: &str, kind: &str, properties: Value) -> Result<()>;
    async fn upsert_edge(&self, from: &str, to: &str, relation: &str) -> Result<()>;
    async fn neighbors(&self, id: &str) -> Result<Vec<String>>;
}

/// A sink for telemetry events destined for a search index. Implementations
/// must treat `document_id` as an idempotency key so replaying a JSONL
/// segment after a crash doesn't duplicate entries.
#[async_trait]
pub trait SearchSink: Send + Sync {
    async fn index(&self, event: &TelemetryEvent) -> Result<()>;
}

/// A gateway to tools hosted by an external MCP server, surfaced to the
/// registry as ordinary `Tool` implementations under an `mcp_` prefix.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    async fn list_remote_tools(&self) -> Result<Vec<aegis_models::ToolDefinition>>;
    async fn call_remote_tool(&self, name: &str, arguments: Value) -> Result<Value>;
}
