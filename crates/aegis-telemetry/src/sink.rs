//! Telemetry sinks. The bus fans each event out to every registered sink;
//! a sink failing to write never blocks or fails the caller's request — it
//! only logs a `tracing` warning.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use aegis_models::TelemetryEvent;

use crate::error::Result;

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn write(&self, event: &TelemetryEvent) -> Result<()>;
}

/// Discards everything. Used where a sink slot is required but telemetry
/// export is disabled.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl TelemetrySink for NullSink {
    async fn write(&self, _event: &TelemetryEvent) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink for tests and for the `telemetry query` CLI path when
/// backed by a short-lived in-process bus.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn write(&self, event: &TelemetryEvent) -> Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

/// Appends one JSON object per line to a file, rotating to `<path>.1`,
/// `<path>.2`, ... once the active file exceeds `max_bytes`.
pub struct JsonlSink {
    path: PathBuf,
    max_bytes: u64,
    backups: u32,
    state: Mutex<JsonlSinkState>,
}

struct JsonlSinkState {
    file: tokio::fs::File,
    written_bytes: u64,
}

impl JsonlSink {
    pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
    pub const DEFAULT_BACKUPS: u32 = 3;

    pub async fn new(path: impl Into<PathBuf>, max_bytes: u64, backups: u32) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let written_bytes = file.metadata().await?.len();
        Ok(Self {
            path,
            max_bytes,
            backups,
            state: Mutex::new(JsonlSinkState {
                file,
                written_bytes,
            }),
        })
    }

    async fn rotate(&self, state: &mut JsonlSinkState) -> Result<()> {
        drop(std::mem::replace(
            &mut state.file,
            tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?,
        ));
        for i in (1..self.backups).rev() {
            let from = self.backup_path(i);
            let to = self.backup_path(i + 1);
            if tokio::fs::try_exists(&from).await.unwrap_or(false) {
                let _ = tokio::fs::rename(&from, &to).await;
            }
        }
        if self.backups > 0 {
            let _ = tokio::fs::rename(&self.path, self.backup_path(1)).await;
        }
        state.file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        state.written_bytes = 0;
        Ok(())
    }

    fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.clone();
        let ext = name
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        name.set_extension(format!("{ext}.{index}"));
        name
    }
}

#[async_trait]
impl TelemetrySink for JsonlSink {
    async fn write(&self, event: &TelemetryEvent) -> Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        let mut state = self.state.lock().await;
        if state.written_bytes + line.len() as u64 > self.max_bytes && state.written_bytes > 0 {
            self.rotate(&mut state).await?;
        }
        state.file.write_all(&line).await?;
        state.file.flush().await?;
        state.written_bytes += line.len() as u64;
        Ok(())
    }
}

pub type SharedSink = Arc<dyn TelemetrySink>;

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_models::EventLevel;
    use uuid::Uuid;

    #[tokio::test]
    async fn recording_sink_collects_events() {
        let sink = RecordingSink::new();
        let event = TelemetryEvent::new("request_trace", Uuid::new_v4(), EventLevel::Info);
        sink.write(&event).await.unwrap();
        assert_eq!(sink.events().await.len(), 1);
    }

    #[tokio::test]
    async fn jsonl_sink_appends_and_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = JsonlSink::new(&path, 200, 2).await.unwrap();
        for _ in 0..20 {
            let event = TelemetryEvent::new("request_trace", Uuid::new_v4(), EventLevel::Info)
                .with_field("note", "padding-padding-padding".into());
            sink.write(&event).await.unwrap();
        }
        assert!(path.exists());
        let backup = {
            let mut p = path.clone();
            p.set_extension("jsonl.1");
            p
        };
        assert!(tokio::fs::try_exists(&backup).await.unwrap());
    }
}
