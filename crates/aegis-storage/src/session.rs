//! `LocalSessionStore`: conversation sessions persisted one JSON file per
//! session under `<root>/sessions/`.

use std::path::Path;

use async_trait::async_trait;
use uuid::Uuid;

use aegis_models::Session;
use aegis_traits::{SessionStore, TraitError};

use crate::error::Result;
use crate::local_store::LocalStore;

pub struct LocalSessionStore {
    store: LocalStore,
}

impl LocalSessionStore {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            store: LocalStore::open(root.as_ref().join("sessions")).await?,
        })
    }

    pub async fn get(&self, session_id: Uuid) -> Result<Option<Session>> {
        self.store.get(&session_id.to_string()).await
    }

    pub async fn put(&self, session: &Session) -> Result<()> {
        self.store.put(&session.session_id.to_string(), session).await
    }

    pub async fn remove(&self, session_id: Uuid) -> Result<bool> {
        self.store.delete(&session_id.to_string()).await
    }

    pub async fn recent(&self, limit: usize) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self.store.list_all().await?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions.truncate(limit);
        Ok(sessions)
    }
}

#[async_trait]
impl SessionStore for LocalSessionStore {
    async fn load(&self, session_id: Uuid) -> aegis_traits::Result<Option<Session>> {
        self.get(session_id)
            .await
            .map_err(|e| TraitError::StoreFailed(e.to_string()))
    }

    async fn save(&self, session: &Session) -> aegis_traits::Result<()> {
        self.put(session)
            .await
            .map_err(|e| TraitError::StoreFailed(e.to_string()))
    }

    async fn delete(&self, session_id: Uuid) -> aegis_traits::Result<()> {
        self.remove(session_id)
            .await
            .map(|_| ())
            .map_err(|e| TraitError::StoreFailed(e.to_string()))
    }

    async fn list_recent(&self, limit: usize) -> aegis_traits::Result<Vec<Session>> {
        self.recent(limit)
            .await
            .map_err(|e| TraitError::StoreFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_models::Mode;
    use tempfile::tempdir;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let store = LocalSessionStore::open(dir.path()).await.unwrap();
        let session = Session::new("CHAT", Mode::Normal);
        store.put(&session).await.unwrap();
        let loaded = store.get(session.session_id).await.unwrap().unwrap();
        assert_eq!(loaded.session_id, session.session_id);
    }

    #[tokio::test]
    async fn missing_session_returns_none() {
        let dir = tempdir().unwrap();
        let store = LocalSessionStore::open(dir.path()).await.unwrap();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recent_sorts_newest_first() {
        let dir = tempdir().unwrap();
        let store = LocalSessionStore::open(dir.path()).await.unwrap();
        let older = Session::new("CHAT", Mode::Normal);
        store.put(&older).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = Session::new("CHAT", Mode::Normal);
        store.put(&newer).await.unwrap();
        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent[0].session_id, newer.session_id);
    }

    #[tokio::test]
    async fn remove_deletes_session() {
        let dir = tempdir().unwrap();
        let store = LocalSessionStore::open(dir.path()).await.unwrap();
        let session = Session::new("CHAT", Mode::Normal);
        store.put(&session).await.unwrap();
        assert!(store.remove(session.session_id).await.unwrap());
        assert!(store.get(session.session_id).await.unwrap().is_none());
    }
}
