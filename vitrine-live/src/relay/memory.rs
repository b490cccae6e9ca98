//! In-process relay.
//!
//! Forwards tracks and data messages between room connections inside one
//! process. Backs the local demo and the test suite; rooms live in a
//! concurrent table and each room fans events out over a broadcast bus.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use vitrine_core::credential::RelayCredential;
use vitrine_core::models::{ParticipantId, RoomName};
use vitrine_core::{Error, Result};

use crate::media::LocalTrack;

use super::{MediaRelay, RelayRoom, RemoteTrack, RoomEvent};

/// Bounded so a slow consumer lags instead of growing the bus without limit.
const ROOM_EVENT_CHANNEL_CAPACITY: usize = 256;

struct RoomShared {
    name: RoomName,
    events: broadcast::Sender<RoomEvent>,
    tracks: RwLock<Vec<RemoteTrack>>,
    connections: AtomicUsize,
}

/// In-memory relay with one broadcast bus per room.
#[derive(Default)]
pub struct InProcessRelay {
    rooms: DashMap<RoomName, Arc<RoomShared>>,
}

impl InProcessRelay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn room(&self, name: RoomName) -> Arc<RoomShared> {
        self.rooms
            .entry(name.clone())
            .or_insert_with(|| {
                let (events, _) = broadcast::channel(ROOM_EVENT_CHANNEL_CAPACITY);
                debug!(room = name.as_str(), "Relay room created");
                Arc::new(RoomShared {
                    name,
                    events,
                    tracks: RwLock::new(Vec::new()),
                    connections: AtomicUsize::new(0),
                })
            })
            .value()
            .clone()
    }

    /// Number of live connections to a room (test observability).
    #[must_use]
    pub fn active_connections(&self, name: &RoomName) -> usize {
        self.rooms
            .get(name)
            .map_or(0, |room| room.connections.load(Ordering::SeqCst))
    }

    /// Number of currently published tracks in a room (test observability).
    #[must_use]
    pub fn published_track_count(&self, name: &RoomName) -> usize {
        self.rooms.get(name).map_or(0, |room| room.tracks.read().len())
    }
}

#[async_trait]
impl MediaRelay for InProcessRelay {
    async fn connect(&self, credential: &RelayCredential) -> Result<Arc<dyn RelayRoom>> {
        // Tokens are room-scoped: `room.role.exp.sig`
        let room_name = credential
            .token
            .split('.')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::Credential("relay token carries no room scope".to_string()))?;

        let shared = self.room(RoomName::from(room_name.to_string()));
        shared.connections.fetch_add(1, Ordering::SeqCst);
        let participant = ParticipantId::new();

        info!(
            room = shared.name.as_str(),
            participant = %participant,
            "Joined relay room"
        );

        Ok(Arc::new(InProcessRoom {
            shared,
            participant,
            connected: AtomicBool::new(true),
        }))
    }
}

/// One connection to an in-process room
pub struct InProcessRoom {
    shared: Arc<RoomShared>,
    participant: ParticipantId,
    connected: AtomicBool,
}

impl InProcessRoom {
    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Relay("room connection already released".to_string()))
        }
    }
}

#[async_trait]
impl RelayRoom for InProcessRoom {
    fn room_name(&self) -> &RoomName {
        &self.shared.name
    }

    fn local_participant(&self) -> ParticipantId {
        self.participant
    }

    async fn publish_track(&self, track: &LocalTrack) -> Result<RemoteTrack> {
        self.ensure_connected()?;
        let remote = RemoteTrack {
            id: track.id().clone(),
            kind: track.kind(),
            published_by: self.participant,
        };
        self.shared.tracks.write().push(remote.clone());
        // No subscribers yet is fine; late joiners read published_tracks()
        let _ = self.shared.events.send(RoomEvent::TrackSubscribed {
            track: remote.clone(),
        });
        Ok(remote)
    }

    async fn publish_data(&self, payload: Bytes) -> Result<()> {
        self.ensure_connected()?;
        let _ = self.shared.events.send(RoomEvent::DataReceived {
            payload,
            from: self.participant,
        });
        Ok(())
    }

    fn published_tracks(&self) -> Vec<RemoteTrack> {
        self.shared.tracks.read().clone()
    }

    fn events(&self) -> broadcast::Receiver<RoomEvent> {
        self.shared.events.subscribe()
    }

    async fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.shared.connections.fetch_sub(1, Ordering::SeqCst);
            self.shared
                .tracks
                .write()
                .retain(|track| track.published_by != self.participant);
            debug!(
                room = self.shared.name.as_str(),
                participant = %self.participant,
                "Left relay room"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TestPatternSource;
    use crate::media::MediaSource;
    use vitrine_core::credential::{CredentialService, HmacCredentialIssuer, RelayRole};
    use vitrine_core::models::StoreId;

    fn room_name() -> RoomName {
        RoomName::for_store(&StoreId::from_string("shop12345678".to_string()))
    }

    async fn join(relay: &InProcessRelay, role: RelayRole) -> Arc<dyn RelayRoom> {
        let issuer = HmacCredentialIssuer::new(
            "memory://local",
            b"secret",
            std::time::Duration::from_secs(60),
        );
        let credential = issuer.request(role, &room_name()).await.expect("credential");
        relay.connect(&credential).await.expect("connect")
    }

    #[tokio::test]
    async fn test_both_roles_land_in_the_same_room() {
        let relay = InProcessRelay::new();
        let publisher = join(&relay, RelayRole::Publisher).await;
        let subscriber = join(&relay, RelayRole::Subscriber).await;

        assert_eq!(publisher.room_name(), subscriber.room_name());
        assert_eq!(relay.active_connections(&room_name()), 2);
        assert_ne!(publisher.local_participant(), subscriber.local_participant());
    }

    #[tokio::test]
    async fn test_published_track_reaches_subscriber_and_late_joiner() {
        let relay = InProcessRelay::new();
        let publisher = join(&relay, RelayRole::Publisher).await;
        let subscriber = join(&relay, RelayRole::Subscriber).await;
        let mut events = subscriber.events();

        let video = TestPatternSource.acquire_video().await.expect("video");
        publisher.publish_track(&video).await.expect("publish");

        match events.recv().await.expect("event") {
            RoomEvent::TrackSubscribed { track } => assert!(track.kind.is_video()),
            other => panic!("unexpected event: {other:?}"),
        }

        // A participant joining afterwards still sees the track
        let late = join(&relay, RelayRole::Subscriber).await;
        assert_eq!(late.published_tracks().len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent_and_releases_tracks() {
        let relay = InProcessRelay::new();
        let publisher = join(&relay, RelayRole::Publisher).await;
        let video = TestPatternSource.acquire_video().await.expect("video");
        publisher.publish_track(&video).await.expect("publish");
        assert_eq!(relay.published_track_count(&room_name()), 1);

        publisher.disconnect().await;
        publisher.disconnect().await;

        assert_eq!(relay.active_connections(&room_name()), 0);
        assert_eq!(relay.published_track_count(&room_name()), 0);
        assert!(publisher.publish_data(Bytes::from_static(b"{}")).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected() {
        let relay = InProcessRelay::new();
        let credential = RelayCredential {
            url: "memory://local".to_string(),
            token: String::new(),
        };
        assert!(relay.connect(&credential).await.is_err());
    }
}
