//! Broadcaster-side media room client.
//!
//! Drives the publish state machine: request a publisher credential, connect
//! to the relay and publish camera/microphone tracks. Whenever credential or
//! relay negotiation fails the client degrades to local capture so the
//! operator always keeps at least a preview, and the periodic snapshot keeps
//! the session thumbnail fresh for viewers on the fallback path.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vitrine_core::config::BroadcastConfig;
use vitrine_core::credential::{CredentialService, RelayRole};
use vitrine_core::models::{
    InteractionEvent, InteractionTally, LiveSession, RoomName, StoreProfile,
};
use vitrine_core::registry::SessionRegistry;
use vitrine_core::Result;

use crate::media::{LocalTrack, MediaSource};
use crate::relay::{MediaRelay, RelayRoom, RoomEvent};
use crate::surface::{Placeholder, RenderSurface};
use crate::thumbnail::ThumbnailPipeline;

/// Publish pipeline state.
///
/// The fallback chain is a tagged variant rather than nested error handling
/// so every transition stays independently observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Idle,
    RequestingCredential,
    ConnectingRelay,
    Publishing,
    LocalCaptureOnly,
    Failed,
}

impl PublishState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RequestingCredential => "requesting_credential",
            Self::ConnectingRelay => "connecting_relay",
            Self::Publishing => "publishing",
            Self::LocalCaptureOnly => "local_capture_only",
            Self::Failed => "failed",
        }
    }

    /// States in which the snapshot loop runs.
    #[must_use]
    pub const fn captures_snapshots(&self) -> bool {
        matches!(self, Self::Publishing | Self::LocalCaptureOnly)
    }
}

pub struct MediaRoomClient {
    store: StoreProfile,
    registry: Arc<dyn SessionRegistry>,
    credentials: Arc<dyn CredentialService>,
    relay: Arc<dyn MediaRelay>,
    media: Arc<dyn MediaSource>,
    surface: RenderSurface,
    snapshot_interval: Duration,
    state: RwLock<PublishState>,
    session: Mutex<Option<LiveSession>>,
    room: AsyncMutex<Option<Arc<dyn RelayRoom>>>,
    video: Mutex<Option<LocalTrack>>,
    audio: Mutex<Option<LocalTrack>>,
    tally: Arc<Mutex<InteractionTally>>,
    /// Cancels the snapshot and interaction loops of the active state.
    loops: Mutex<Option<CancellationToken>>,
}

impl MediaRoomClient {
    #[must_use]
    pub fn new(
        store: StoreProfile,
        registry: Arc<dyn SessionRegistry>,
        credentials: Arc<dyn CredentialService>,
        relay: Arc<dyn MediaRelay>,
        media: Arc<dyn MediaSource>,
        surface: RenderSurface,
        config: &BroadcastConfig,
    ) -> Self {
        Self {
            store,
            registry,
            credentials,
            relay,
            media,
            surface,
            snapshot_interval: config.snapshot_interval(),
            state: RwLock::new(PublishState::Idle),
            session: Mutex::new(None),
            room: AsyncMutex::new(None),
            video: Mutex::new(None),
            audio: Mutex::new(None),
            tally: Arc::new(Mutex::new(InteractionTally::new())),
            loops: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> PublishState {
        *self.state.read()
    }

    /// Snapshot of the broadcaster-observed interaction counters.
    #[must_use]
    pub fn tally(&self) -> InteractionTally {
        self.tally.lock().clone()
    }

    #[must_use]
    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    #[must_use]
    pub fn session(&self) -> Option<LiveSession> {
        self.session.lock().clone()
    }

    fn set_state(&self, next: PublishState) {
        let mut state = self.state.write();
        debug!(
            store_id = self.store.id.as_str(),
            from = state.as_str(),
            to = next.as_str(),
            "Publish state transition"
        );
        *state = next;
    }

    /// Create this store's live session.
    ///
    /// Surfaces `Error::Conflict` untouched when a session is already active;
    /// nothing is created in that case.
    pub async fn start(
        &self,
        title: impl Into<String> + Send,
        thumbnail: Option<String>,
    ) -> Result<LiveSession> {
        let session = self
            .registry
            .create(self.store.clone(), title.into(), thumbnail)
            .await?;
        info!(
            session_id = session.id.as_str(),
            store_id = self.store.id.as_str(),
            title = session.title.as_str(),
            "Live session started"
        );
        *self.session.lock() = Some(session.clone());
        Ok(session)
    }

    /// Drive the publish pipeline to its best reachable state.
    ///
    /// Credential and relay failures are never surfaced: the client falls
    /// back to local capture, and only a denied camera at that final tier
    /// yields `Failed` (with a placeholder, not an error).
    pub async fn attach_media(&self) -> PublishState {
        // Restart-safe: release whatever a previous attach left behind.
        self.release_media().await;
        self.tally.lock().reset();

        let room_name = RoomName::for_store(&self.store.id);

        self.set_state(PublishState::RequestingCredential);
        let credential = match self
            .credentials
            .request(RelayRole::Publisher, &room_name)
            .await
        {
            Ok(credential) => credential,
            Err(err) => {
                warn!(
                    room = room_name.as_str(),
                    error = %err,
                    "Publisher credential unavailable, falling back to local capture"
                );
                return self.fall_back_to_local_capture().await;
            }
        };

        self.set_state(PublishState::ConnectingRelay);
        let room = match self.relay.connect(&credential).await {
            Ok(room) => room,
            Err(err) => {
                warn!(
                    room = room_name.as_str(),
                    error = %err,
                    "Relay unreachable, falling back to local capture"
                );
                return self.fall_back_to_local_capture().await;
            }
        };

        let video = match self.media.acquire_video().await {
            Ok(video) => video,
            Err(err) => {
                warn!(error = %err, "Camera unavailable while publishing");
                room.disconnect().await;
                return self.fall_back_to_local_capture().await;
            }
        };
        if let Err(err) = room.publish_track(&video).await {
            warn!(error = %err, "Video publish rejected, falling back to local capture");
            video.stop();
            room.disconnect().await;
            return self.fall_back_to_local_capture().await;
        }

        // Audio is best-effort: a muted microphone must not end the live.
        match self.media.acquire_audio().await {
            Ok(audio) => {
                if let Err(err) = room.publish_track(&audio).await {
                    debug!(error = %err, "Audio publish failed, continuing video-only");
                    audio.stop();
                } else {
                    *self.audio.lock() = Some(audio);
                }
            }
            Err(err) => debug!(error = %err, "Audio unavailable, continuing video-only"),
        }

        self.surface.attach_local_preview(&video);
        *self.video.lock() = Some(video);

        let guard = CancellationToken::new();
        self.spawn_snapshot_loop(guard.child_token());
        self.spawn_interaction_intake(&room, guard.child_token());
        *self.loops.lock() = Some(guard);
        *self.room.lock().await = Some(room);

        self.set_state(PublishState::Publishing);
        PublishState::Publishing
    }

    /// Final fallback tier: camera preview and snapshots, no network publish.
    async fn fall_back_to_local_capture(&self) -> PublishState {
        match self.media.acquire_video().await {
            Ok(video) => {
                self.surface.attach_local_preview(&video);
                *self.video.lock() = Some(video);

                let guard = CancellationToken::new();
                self.spawn_snapshot_loop(guard.child_token());
                *self.loops.lock() = Some(guard);

                self.set_state(PublishState::LocalCaptureOnly);
                PublishState::LocalCaptureOnly
            }
            Err(err) => {
                warn!(
                    store_id = self.store.id.as_str(),
                    error = %err,
                    "Local capture denied, no preview available"
                );
                self.surface.show_placeholder(Placeholder::CameraUnavailable);
                self.set_state(PublishState::Failed);
                PublishState::Failed
            }
        }
    }

    /// First capture immediate, then one per interval, until cancelled.
    fn spawn_snapshot_loop(&self, cancel: CancellationToken) {
        let pipeline =
            ThumbnailPipeline::new(Arc::clone(&self.registry), self.store.id.clone());
        let surface = self.surface.clone();
        let period = self.snapshot_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => pipeline.capture_and_upload(&surface).await,
                }
            }
        });
    }

    /// Fold inbound interaction broadcasts into the session tally.
    fn spawn_interaction_intake(&self, room: &Arc<dyn RelayRoom>, cancel: CancellationToken) {
        let tally = Arc::clone(&self.tally);
        let me = room.local_participant();
        let mut events = room.events();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(RoomEvent::DataReceived { payload, from }) if from != me => {
                            match InteractionEvent::from_payload(&payload) {
                                Ok(interaction) => tally.lock().record(&interaction),
                                Err(err) => {
                                    debug!(error = %err, "Ignoring malformed interaction");
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Interaction intake lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    /// Stop loops, local tracks and the room connection, each attempted
    /// independently. The snapshot loop dies the instant the state is exited.
    async fn release_media(&self) {
        if let Some(guard) = self.loops.lock().take() {
            guard.cancel();
        }
        if let Some(video) = self.video.lock().take() {
            video.stop();
        }
        if let Some(audio) = self.audio.lock().take() {
            audio.stop();
        }
        if let Some(room) = self.room.lock().await.take() {
            room.disconnect().await;
        }
    }

    /// End the live: release media, clear the surface, delete the session row.
    pub async fn stop(&self) {
        self.release_media().await;
        self.surface.clear();
        self.session.lock().take();

        // The row may already be gone (second stop, registry cleanup); only
        // real failures are worth a warning.
        if let Err(err) = self.registry.delete(&self.store.id).await {
            if !err.is_not_found() {
                warn!(
                    store_id = self.store.id.as_str(),
                    error = %err,
                    "Failed to delete live session"
                );
            }
        }

        self.set_state(PublishState::Idle);
        info!(store_id = self.store.id.as_str(), "Live session stopped");
    }
}
