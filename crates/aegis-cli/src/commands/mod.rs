pub mod chat;
pub mod session;
pub mod telemetry;
