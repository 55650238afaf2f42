//! Long-horizon host metrics history, appended by the Scheduler's
//! consolidation job from the Sensor Daemon's in-memory ring buffer.
//! One append-only JSONL file per month keeps a single file from growing
//! without bound while still allowing a simple chronological scan.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use aegis_models::{MetricSnapshot, MetricsSummary, Stats};

use crate::error::Result;

pub struct MetricsHistoryStore {
    root: PathBuf,
}

impl MetricsHistoryStore {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().join("metrics");
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn file_for(&self, snapshot: &MetricSnapshot) -> PathBuf {
        self.root
            .join(format!("{}.jsonl", snapshot.timestamp.format("%Y-%m")))
    }

    pub async fn append(&self, snapshot: &MetricSnapshot) -> Result<()> {
        let path = self.file_for(snapshot);
        let mut line = serde_json::to_vec(snapshot)?;
        line.push(b'\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(&line).await?;
        Ok(())
    }

    /// Read every snapshot in the months touched by `[start, end]`, filtered
    /// to the exact window, and reduce to a `MetricsSummary`.
    pub async fn summarize(
        &self,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> Result<MetricsSummary> {
        let mut samples = Vec::new();
        let mut month = start;
        loop {
            let path = self.root.join(format!("{}.jsonl", month.format("%Y-%m")));
            if let Ok(contents) = tokio::fs::read_to_string(&path).await {
                for line in contents.lines() {
                    if let Ok(snapshot) = serde_json::from_str::<MetricSnapshot>(line) {
                        if snapshot.timestamp >= start && snapshot.timestamp <= end {
                            samples.push(snapshot);
                        }
                    }
                }
            }
            if month.format("%Y-%m").to_string() == end.format("%Y-%m").to_string() {
                break;
            }
            month += chrono::Duration::days(28);
        }

        let cpu = Stats::from_samples(&samples.iter().map(|s| s.cpu_percent).collect::<Vec<_>>());
        let memory =
            Stats::from_samples(&samples.iter().map(|s| s.memory_percent).collect::<Vec<_>>());
        let gpu_samples: Vec<f64> = samples.iter().filter_map(|s| s.gpu_percent).collect();
        let gpu = if gpu_samples.is_empty() {
            None
        } else {
            Some(Stats::from_samples(&gpu_samples))
        };

        Ok(MetricsSummary {
            start,
            end,
            duration_s: (end - start).num_milliseconds() as f64 / 1000.0,
            sample_count: samples.len(),
            cpu,
            memory,
            gpu,
            threshold_violations: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn append_then_summarize_includes_samples() {
        let dir = tempdir().unwrap();
        let store = MetricsHistoryStore::open(dir.path()).await.unwrap();
        let now = Utc::now();
        store
            .append(&MetricSnapshot {
                timestamp: now,
                cpu_percent: 42.0,
                memory_percent: 50.0,
                disk_percent: 10.0,
                gpu_percent: None,
                gpu_power_w: None,
                gpu_temp_c: None,
            })
            .await
            .unwrap();
        let summary = store
            .summarize(now - chrono::Duration::minutes(1), now + chrono::Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(summary.sample_count, 1);
        assert_eq!(summary.cpu.avg, 42.0);
    }
}
