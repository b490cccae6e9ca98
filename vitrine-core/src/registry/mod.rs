//! Session registry collaborator.
//!
//! The registry persists which store has an active live session. It is a
//! plain request/response service; the engine only ever creates, lists,
//! deletes and re-thumbnails rows.

mod http;
mod memory;

pub use http::HttpSessionRegistry;
pub use memory::InMemorySessionRegistry;

use async_trait::async_trait;

use crate::models::{LiveSession, StoreId, StoreProfile};
use crate::Result;

#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// All currently active sessions, in registry order.
    async fn list_active(&self) -> Result<Vec<LiveSession>>;

    /// The store's active session, if any.
    async fn get(&self, store: &StoreId) -> Result<Option<LiveSession>>;

    /// Create the store's session. Fails with `Error::Conflict` when the
    /// store already has one active; no partial state is created.
    async fn create(
        &self,
        store: StoreProfile,
        title: String,
        thumbnail: Option<String>,
    ) -> Result<LiveSession>;

    /// Delete the store's active session.
    async fn delete(&self, store: &StoreId) -> Result<()>;

    /// Replace the session thumbnail (the only field mutated post-creation).
    async fn update_thumbnail(&self, store: &StoreId, data_url: String) -> Result<()>;
}
