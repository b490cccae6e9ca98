//! Local media acquisition.
//!
//! A `LocalTrack` is the engine-side handle to a captured camera or
//! microphone track. Handles are cheaply cloneable; whoever acquired the
//! track owns its lifecycle and must `stop()` it on teardown.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use vitrine_core::models::TrackId;
use vitrine_core::Result;

use crate::relay::TrackKind;

struct TrackInner {
    id: TrackId,
    kind: TrackKind,
    ended: AtomicBool,
    frame: RwLock<Option<Bytes>>,
}

/// Handle to a local audio or video track
#[derive(Clone)]
pub struct LocalTrack {
    inner: Arc<TrackInner>,
}

impl LocalTrack {
    #[must_use]
    pub fn new(kind: TrackKind) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: TrackId::new(),
                kind,
                ended: AtomicBool::new(false),
                frame: RwLock::new(None),
            }),
        }
    }

    /// Video track whose rendered frame is already known (test pattern).
    #[must_use]
    pub fn with_frame(kind: TrackKind, frame: Bytes) -> Self {
        let track = Self::new(kind);
        *track.inner.frame.write() = Some(frame);
        track
    }

    #[must_use]
    pub fn id(&self) -> &TrackId {
        &self.inner.id
    }

    #[must_use]
    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    /// Stop capture. The ended state is permanent.
    pub fn stop(&self) {
        self.inner.ended.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.inner.ended.load(Ordering::SeqCst)
    }

    /// Latest rendered frame, if the device produced one. `None` once stopped.
    #[must_use]
    pub fn current_frame(&self) -> Option<Bytes> {
        if self.is_ended() {
            return None;
        }
        self.inner.frame.read().clone()
    }
}

impl std::fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("ended", &self.is_ended())
            .finish()
    }
}

/// Device access seam.
///
/// `acquire_video` failing means the camera permission was denied or the
/// device is missing; the broadcaster treats that as its final fallback tier.
/// Audio is best-effort everywhere.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire_video(&self) -> Result<LocalTrack>;
    async fn acquire_audio(&self) -> Result<LocalTrack>;
}

/// Deterministic JPEG test pattern, enough for snapshot encoding.
const TEST_PATTERN_FRAME: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

/// Media source producing a synthetic pattern; used by the local demo and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct TestPatternSource;

#[async_trait]
impl MediaSource for TestPatternSource {
    async fn acquire_video(&self) -> Result<LocalTrack> {
        Ok(LocalTrack::with_frame(
            TrackKind::Video,
            Bytes::from_static(TEST_PATTERN_FRAME),
        ))
    }

    async fn acquire_audio(&self) -> Result<LocalTrack> {
        Ok(LocalTrack::new(TrackKind::Audio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_is_permanent_and_shared_across_clones() {
        let track = TestPatternSource.acquire_video().await.expect("video");
        let clone = track.clone();
        assert!(!track.is_ended());
        assert!(track.current_frame().is_some());

        clone.stop();
        assert!(track.is_ended());
        assert!(track.current_frame().is_none());
    }

    #[tokio::test]
    async fn test_tracks_get_distinct_ids() {
        let a = TestPatternSource.acquire_video().await.expect("video");
        let b = TestPatternSource.acquire_video().await.expect("video");
        assert_ne!(a.id(), b.id());
        assert!(a.kind().is_video());
    }
}
