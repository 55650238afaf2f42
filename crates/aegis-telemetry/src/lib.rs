//! The trace & telemetry bus: structured, append-only events fanned out to
//! pluggable sinks, plus the per-request `Timer` the Task Executor uses to
//! build phase breakdowns.

pub mod bus;
pub mod error;
pub mod sink;
pub mod timer;

pub use bus::{Emit, TelemetryBus};
pub use error::{Result, TelemetryError};
pub use sink::{JsonlSink, NullSink, RecordingSink, SharedSink, TelemetrySink};
pub use timer::{SpanHandle, Timer};
