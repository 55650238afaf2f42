//! The Sensor Daemon (C3): host resource polling and bounded history.

pub mod daemon;
pub mod ring_buffer;

pub use daemon::{SensorConfig, SensorDaemon};
pub use ring_buffer::SnapshotRing;
