//! No-op collaborators for the External Adapters (C10) the service can run
//! without: a personal knowledge-graph store and a search-index sink. Both
//! backends are out of scope here (they're reached over their own narrow
//! traits from aegis-traits) — these satisfy the seam so the rest of the
//! service never has to special-case "not configured".

use async_trait::async_trait;
use serde_json::Value;

use aegis_models::TelemetryEvent;
use aegis_traits::{GraphStore, Result, SearchSink};

#[derive(Debug, Default)]
pub struct NullGraphAdapter;

#[async_trait]
impl GraphStore for NullGraphAdapter {
    async fn upsert_node(&self, _id: &str, _kind: &str, _properties: Value) -> Result<()> {
        Ok(())
    }

    async fn upsert_edge(&self, _from: &str, _to: &str, _relation: &str) -> Result<()> {
        Ok(())
    }

    async fn neighbors(&self, _id: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Default)]
pub struct NullSearchSink;

#[async_trait]
impl SearchSink for NullSearchSink {
    async fn index(&self, _event: &TelemetryEvent) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn null_graph_adapter_never_errors() {
        let adapter = NullGraphAdapter;
        adapter.upsert_node("a", "kind", Value::Null).await.unwrap();
        adapter.upsert_edge("a", "b", "relates_to").await.unwrap();
        assert!(adapter.neighbors("a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn null_search_sink_never_errors() {
        let sink = NullSearchSink;
        let event = TelemetryEvent::new("request_trace", Uuid::new_v4(), aegis_models::EventLevel::Info);
        sink.index(&event).await.unwrap();
    }
}
