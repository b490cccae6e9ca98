//! Viewer-side media room client.
//!
//! One viewer slot holds at most one relay connection. `connect` always
//! tears the previous connection down first, so rapid session switching can
//! never leave two subscriptions writing to the same rendering surface, and
//! every timer or listener belongs to exactly one room instance.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use vitrine_core::config::ViewerConfig;
use vitrine_core::credential::{CredentialService, RelayRole};
use vitrine_core::models::{InteractionEvent, InteractionTally, LiveSession, ParticipantId};

use crate::relay::{MediaRelay, RelayRoom, RemoteTrack, RoomEvent};
use crate::surface::{Placeholder, RenderSurface};

#[derive(Default)]
struct ViewerSlot {
    room: Option<Arc<dyn RelayRoom>>,
    /// Cancels this connection's pumps and waiting timer.
    guard: Option<CancellationToken>,
}

pub struct MediaRoomViewer {
    credentials: Arc<dyn CredentialService>,
    relay: Arc<dyn MediaRelay>,
    surface: RenderSurface,
    waiting_timeout: Duration,
    slot: AsyncMutex<ViewerSlot>,
    tally: Arc<Mutex<InteractionTally>>,
    muted: Arc<AtomicBool>,
}

impl MediaRoomViewer {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialService>,
        relay: Arc<dyn MediaRelay>,
        surface: RenderSurface,
        config: &ViewerConfig,
    ) -> Self {
        Self {
            credentials,
            relay,
            surface,
            waiting_timeout: config.waiting_timeout(),
            slot: AsyncMutex::new(ViewerSlot::default()),
            tally: Arc::new(Mutex::new(InteractionTally::new())),
            muted: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Snapshot of this connection's interaction counters.
    #[must_use]
    pub fn tally(&self) -> InteractionTally {
        self.tally.lock().clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.slot.lock().await.room.is_some()
    }

    /// Join the session's room and render whatever is available.
    ///
    /// Strictly ordered: the prior connection for this slot is fully released
    /// before the new one is attempted. Credential or relay failure renders
    /// the stored thumbnail (or a placeholder) instead of propagating.
    pub async fn connect(&self, session: &LiveSession) {
        let mut slot = self.slot.lock().await;
        Self::teardown(&mut slot, &self.surface).await;

        // Fresh connection, fresh transient state
        self.tally.lock().reset();
        self.muted.store(true, Ordering::SeqCst);

        let room_name = session.room_name();
        let credential = match self
            .credentials
            .request(RelayRole::Subscriber, &room_name)
            .await
        {
            Ok(credential) => credential,
            Err(err) => {
                debug!(
                    room = room_name.as_str(),
                    error = %err,
                    "Subscriber credential unavailable, rendering fallback"
                );
                self.render_fallback(session);
                return;
            }
        };

        let room = match self.relay.connect(&credential).await {
            Ok(room) => room,
            Err(err) => {
                debug!(
                    room = room_name.as_str(),
                    error = %err,
                    "Relay unreachable, rendering fallback"
                );
                self.render_fallback(session);
                return;
            }
        };

        info!(
            room = room_name.as_str(),
            session_id = session.id.as_str(),
            "Viewer joined live session"
        );

        let guard = CancellationToken::new();
        let waiting = guard.child_token();
        let attached = Arc::new(AtomicBool::new(false));

        // Subscribe before scanning already-published tracks so a track
        // published in between is never missed.
        let events = room.events();
        for track in room.published_tracks() {
            self.attach_if_video(&track, &attached, &waiting);
        }

        self.spawn_event_pump(
            room.local_participant(),
            events,
            guard.child_token(),
            waiting.clone(),
            Arc::clone(&attached),
        );
        self.spawn_waiting_timer(waiting, Arc::clone(&attached));

        slot.room = Some(room);
        slot.guard = Some(guard);
    }

    /// Release the slot. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        let mut slot = self.slot.lock().await;
        Self::teardown(&mut slot, &self.surface).await;
    }

    /// Fire-and-forget interaction publish. Never blocks and never fails the
    /// caller; sends racing a session switch are dropped.
    pub fn send_interaction(&self, event: InteractionEvent) {
        let Ok(payload) = event.to_payload() else {
            return;
        };
        let Ok(slot) = self.slot.try_lock() else {
            return;
        };
        let Some(room) = slot.room.clone() else {
            return;
        };
        drop(slot);
        tokio::spawn(async move {
            if let Err(err) = room.publish_data(payload).await {
                debug!(error = %err, "Interaction send dropped");
            }
        });
    }

    /// Explicit user gesture starting audio playback.
    pub fn unmute_audio(&self) {
        self.muted.store(false, Ordering::SeqCst);
        self.surface.set_muted(false);
    }

    fn render_fallback(&self, session: &LiveSession) {
        match &session.thumbnail {
            Some(thumbnail) => self.surface.show_image(thumbnail.clone()),
            None => self.surface.show_placeholder(Placeholder::LiveInProgress),
        }
    }

    fn attach_if_video(
        &self,
        track: &RemoteTrack,
        attached: &Arc<AtomicBool>,
        waiting: &CancellationToken,
    ) {
        if !track.kind.is_video() {
            return;
        }
        self.surface
            .attach_live_video(track, self.muted.load(Ordering::SeqCst));
        attached.store(true, Ordering::SeqCst);
        waiting.cancel();
    }

    fn spawn_event_pump(
        &self,
        me: ParticipantId,
        mut events: broadcast::Receiver<RoomEvent>,
        cancel: CancellationToken,
        waiting: CancellationToken,
        attached: Arc<AtomicBool>,
    ) {
        let surface = self.surface.clone();
        let tally = Arc::clone(&self.tally);
        let muted = Arc::clone(&self.muted);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(RoomEvent::TrackSubscribed { track }) if track.kind.is_video() => {
                            surface.attach_live_video(&track, muted.load(Ordering::SeqCst));
                            attached.store(true, Ordering::SeqCst);
                            waiting.cancel();
                        }
                        Ok(RoomEvent::DataReceived { payload, from }) if from != me => {
                            Self::record_interaction(&tally, &payload);
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Viewer event stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    /// Placeholder iff no video track attached before the timeout.
    fn spawn_waiting_timer(&self, waiting: CancellationToken, attached: Arc<AtomicBool>) {
        let surface = self.surface.clone();
        let timeout = self.waiting_timeout;
        tokio::spawn(async move {
            tokio::select! {
                () = waiting.cancelled() => {}
                () = tokio::time::sleep(timeout) => {
                    if !attached.load(Ordering::SeqCst) {
                        surface.show_placeholder(Placeholder::WaitingForBroadcaster);
                    }
                }
            }
        });
    }

    fn record_interaction(tally: &Arc<Mutex<InteractionTally>>, payload: &Bytes) {
        match InteractionEvent::from_payload(payload) {
            Ok(interaction) => tally.lock().record(&interaction),
            Err(err) => debug!(error = %err, "Ignoring malformed interaction"),
        }
    }

    async fn teardown(slot: &mut ViewerSlot, surface: &RenderSurface) {
        // Cancelling the guard detaches exactly this connection's listeners
        // and waiting timer; a freshly created room is untouched.
        if let Some(guard) = slot.guard.take() {
            guard.cancel();
        }
        if let Some(room) = slot.room.take() {
            room.disconnect().await;
        }
        surface.clear();
    }
}
