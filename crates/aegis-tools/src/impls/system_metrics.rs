//! `system_metrics_snapshot`: wraps the Sensor Daemon's `Latest()` read. The
//! daemon lives in `aegis-core`, which depends on `aegis-tools` rather than
//! the reverse, so this tool takes a narrow provider trait instead of the
//! concrete daemon type.

use async_trait::async_trait;
use serde_json::Value;

use aegis_models::{MetricSnapshot, ToolDefinition, ToolResult};
use aegis_traits::{Result, Tool};

/// Anything that can hand back the most recent host metric sample.
/// Implemented by the Sensor Daemon; a test double can return a fixed
/// snapshot or `None` to exercise the "no samples yet" path.
pub trait LatestMetricsProvider: Send + Sync {
    fn latest(&self) -> Option<MetricSnapshot>;
}

pub struct SystemMetricsTool<P: LatestMetricsProvider> {
    provider: P,
}

impl<P: LatestMetricsProvider> SystemMetricsTool<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: LatestMetricsProvider + 'static> Tool for SystemMetricsTool<P> {
    fn name(&self) -> &str {
        "system_metrics_snapshot"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "system_metrics_snapshot".into(),
            description: "Returns the most recent CPU/memory/disk/GPU sample".into(),
            parameters: vec![],
            timeout_seconds: 5,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<ToolResult> {
        match self.provider.latest() {
            Some(snapshot) => Ok(ToolResult::ok(
                "system_metrics_snapshot",
                serde_json::to_value(snapshot).unwrap_or(Value::Null),
                0,
            )),
            None => Ok(ToolResult::err(
                "system_metrics_snapshot",
                "no samples collected yet",
                0,
            )),
        }
    }
}
