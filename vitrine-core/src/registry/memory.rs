//! In-memory session registry used by tests and the local demo.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use crate::models::{LiveSession, StoreId, StoreProfile};
use crate::{Error, Result};

use super::SessionRegistry;

/// DashMap-backed registry enforcing at most one active session per store.
#[derive(Debug, Default)]
pub struct InMemorySessionRegistry {
    sessions: DashMap<StoreId, LiveSession>,
}

impl InMemorySessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active sessions (test observability).
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn list_active(&self) -> Result<Vec<LiveSession>> {
        let mut sessions: Vec<LiveSession> =
            self.sessions.iter().map(|entry| entry.value().clone()).collect();
        // Stable order for navigation: oldest live first
        sessions.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        Ok(sessions)
    }

    async fn get(&self, store: &StoreId) -> Result<Option<LiveSession>> {
        Ok(self.sessions.get(store).map(|entry| entry.value().clone()))
    }

    async fn create(
        &self,
        store: StoreProfile,
        title: String,
        thumbnail: Option<String>,
    ) -> Result<LiveSession> {
        match self.sessions.entry(store.id.clone()) {
            Entry::Occupied(_) => Err(Error::Conflict(format!(
                "store {} already has an active live session",
                store.id
            ))),
            Entry::Vacant(vacant) => {
                let session = LiveSession::new(store, title, thumbnail);
                info!(
                    session_id = session.id.as_str(),
                    store_id = session.store.id.as_str(),
                    title = session.title.as_str(),
                    "Live session created"
                );
                vacant.insert(session.clone());
                Ok(session)
            }
        }
    }

    async fn delete(&self, store: &StoreId) -> Result<()> {
        match self.sessions.remove(store) {
            Some((_, session)) => {
                info!(
                    session_id = session.id.as_str(),
                    store_id = store.as_str(),
                    "Live session deleted"
                );
                Ok(())
            }
            None => Err(Error::NotFound(format!(
                "store {store} has no active live session"
            ))),
        }
    }

    async fn update_thumbnail(&self, store: &StoreId, data_url: String) -> Result<()> {
        match self.sessions.get_mut(store) {
            Some(mut entry) => {
                entry.value_mut().thumbnail = Some(data_url);
                Ok(())
            }
            None => Err(Error::NotFound(format!(
                "store {store} has no active live session"
            ))),
        }
    }
}
