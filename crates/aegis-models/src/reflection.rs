//! Captain's-Log reflection artefact, generated after a request completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::MetricsSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionEntry {
    pub entry_id: String,
    pub trace_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub insights: Vec<String>,
    pub proposed_change: Option<String>,
    pub metrics_structured: Option<MetricsSummary>,
}

impl ReflectionEntry {
    /// File name per the spec's `YYYYMMDD-HHMMSS-TRACE-SEQ.json` format.
    pub fn file_name(&self, sequence: u32) -> String {
        format!(
            "{}-{}-{:04}.json",
            self.created_at.format("%Y%m%d-%H%M%S"),
            self.trace_id,
            sequence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_well_formed() {
        let entry = ReflectionEntry {
            entry_id: "e1".into(),
            trace_id: Uuid::nil(),
            created_at: Utc::now(),
            insights: vec![],
            proposed_change: None,
            metrics_structured: None,
        };
        let name = entry.file_name(1);
        assert!(name.ends_with("-0001.json"));
    }
}
