//! Captain's-Log reflection storage, one JSON file per entry under
//! `<root>/reflections/`.

use std::path::Path;

use aegis_models::ReflectionEntry;

use crate::error::Result;
use crate::local_store::LocalStore;

pub struct ReflectionStore {
    store: LocalStore,
}

impl ReflectionStore {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            store: LocalStore::open(root.as_ref().join("reflections")).await?,
        })
    }

    pub async fn put(&self, entry: &ReflectionEntry) -> Result<()> {
        self.store.put(&entry.entry_id, entry).await
    }

    pub async fn get(&self, entry_id: &str) -> Result<Option<ReflectionEntry>> {
        self.store.get(entry_id).await
    }

    pub async fn recent(&self, limit: usize) -> Result<Vec<ReflectionEntry>> {
        let mut entries: Vec<ReflectionEntry> = self.store.list_all().await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;
    use uuid::Uuid;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let store = ReflectionStore::open(dir.path()).await.unwrap();
        let entry = ReflectionEntry {
            entry_id: "e1".into(),
            trace_id: Uuid::new_v4(),
            created_at: Utc::now(),
            insights: vec!["noted a slow tool call".into()],
            proposed_change: None,
            metrics_structured: None,
        };
        store.put(&entry).await.unwrap();
        let loaded = store.get("e1").await.unwrap().unwrap();
        assert_eq!(loaded.insights, entry.insights);
    }
}
