//! Real-time media relay abstraction.
//!
//! The relay (an SFU) forwards published tracks and best-effort data
//! messages between room participants. The engine only depends on this seam:
//! `connect(credential)` yields a room handle owning one connection, and all
//! events for that connection flow through receivers obtained from that
//! handle, so tearing a handle down detaches exactly its listeners.

mod memory;

pub use memory::InProcessRelay;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::broadcast;

use vitrine_core::credential::RelayCredential;
use vitrine_core::models::{ParticipantId, RoomName, TrackId};
use vitrine_core::Result;

use crate::media::LocalTrack;

/// Media track kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    #[must_use]
    pub const fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }
}

/// A track some participant has published into the room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: TrackId,
    pub kind: TrackKind,
    pub published_by: ParticipantId,
}

/// Events observed on one room connection
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// A remote participant's track became subscribable
    TrackSubscribed { track: RemoteTrack },
    /// Best-effort broadcast payload (UTF-8 JSON interaction message)
    DataReceived {
        payload: Bytes,
        from: ParticipantId,
    },
}

/// One connection to a relay room.
///
/// The handle exclusively owns its connection: `disconnect` is idempotent,
/// and receivers from `events()` lapse with the handle's pumps, never with
/// global state.
#[async_trait]
pub trait RelayRoom: Send + Sync {
    fn room_name(&self) -> &RoomName;

    /// Identity of this connection, attached to everything it publishes.
    fn local_participant(&self) -> ParticipantId;

    /// Publish a local track to the room.
    async fn publish_track(&self, track: &LocalTrack) -> Result<RemoteTrack>;

    /// Broadcast a data message to the room. At-most-once, no acknowledgement.
    async fn publish_data(&self, payload: Bytes) -> Result<()>;

    /// Tracks already published when this snapshot is taken.
    fn published_tracks(&self) -> Vec<RemoteTrack>;

    /// Subscribe to events for this connection.
    fn events(&self) -> broadcast::Receiver<RoomEvent>;

    /// Release the connection. Safe to call repeatedly.
    async fn disconnect(&self);
}

#[async_trait]
pub trait MediaRelay: Send + Sync {
    /// Join the room the credential is scoped to.
    async fn connect(&self, credential: &RelayCredential) -> Result<Arc<dyn RelayRoom>>;
}
