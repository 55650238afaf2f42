//! Shared data model types for the aegis agent core.
//!
//! One module per aggregate, mirroring the teacher corpus's
//! `restflow-core/src/models/` layout: plain serde structs and closed enums,
//! no business logic.

pub mod execution;
pub mod message;
pub mod metrics;
pub mod mode;
pub mod ops_status;
pub mod policy;
pub mod reflection;
pub mod session;
pub mod telemetry;
pub mod timing;
pub mod tool;
pub mod trace;

pub use execution::{ExecutionContext, ModelRole, RoutingDecision, RoutingResult, TaskState};
pub use ops_status::{ComponentHealth, ModeTransitionRecord};
pub use message::{Message, Role, ToolCall};
pub use metrics::{MetricSnapshot, MetricsSummary, Stats};
pub use mode::{Mode, ModeDefinition, ModeThresholds};
pub use policy::{Decision, RateLimitConfig, RiskLevel, ToolPolicy};
pub use reflection::ReflectionEntry;
pub use session::Session;
pub use telemetry::{EventLevel, FieldValue, TelemetryEvent};
pub use timing::{Phase, TimingSpan};
pub use tool::{ToolDefinition, ToolParameter, ToolResult};
pub use trace::TraceContext;
