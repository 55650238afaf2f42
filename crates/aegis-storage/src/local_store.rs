//! A JSON-file-per-entity directory store: the shared persistence idiom
//! every aggregate in this crate builds on. Each record lives at
//! `<root>/<id>.json`; a listing is a directory scan plus a deserialize,
//! which is fine at the scale this crate operates at (hundreds to low
//! thousands of sessions/reflections on a single machine).

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;

pub struct LocalStore {
    root: PathBuf,
    lock: RwLock<()>,
}

impl LocalStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            lock: RwLock::new(()),
        })
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    pub async fn put<T: Serialize + Sync>(&self, id: &str, value: &T) -> Result<()> {
        let _guard = self.lock.write().await;
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(self.entry_path(id), bytes).await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        let _guard = self.lock.read().await;
        let path = self.entry_path(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.write().await;
        match tokio::fs::remove_file(self.entry_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let _guard = self.lock.read().await;
        let mut items = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(entry.path()).await?;
            if let Ok(value) = serde_json::from_slice(&bytes) {
                items.push(value);
            }
        }
        Ok(items)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
