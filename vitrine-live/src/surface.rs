//! Rendering surface.
//!
//! The single slot a broadcaster preview or viewer playback renders into.
//! Attaching replaces whatever was shown before, so two connections can never
//! stack content; teardown clears the slot.

use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::media::LocalTrack;
use crate::relay::RemoteTrack;
use vitrine_core::models::TrackId;

/// Static content shown when no live video is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Connected, no video track arrived yet
    WaitingForBroadcaster,
    /// Live exists but media negotiation was unavailable
    LiveInProgress,
    /// Camera permission denied at the final fallback tier
    CameraUnavailable,
    /// No active session anywhere
    NoLiveAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceContent {
    Empty,
    /// Broadcaster-side local camera preview
    LocalPreview { track: TrackId },
    /// Viewer-side remote playback
    LiveVideo { track: TrackId, muted: bool },
    /// Stored thumbnail or other static image
    Image { data_url: String },
    Placeholder(Placeholder),
}

struct SurfaceInner {
    content: RwLock<SurfaceContent>,
    preview: RwLock<Option<LocalTrack>>,
}

/// Cheaply cloneable handle to one rendering slot
#[derive(Clone)]
pub struct RenderSurface {
    inner: Arc<SurfaceInner>,
}

impl RenderSurface {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SurfaceInner {
                content: RwLock::new(SurfaceContent::Empty),
                preview: RwLock::new(None),
            }),
        }
    }

    #[must_use]
    pub fn content(&self) -> SurfaceContent {
        self.inner.content.read().clone()
    }

    #[must_use]
    pub fn has_live_video(&self) -> bool {
        matches!(*self.inner.content.read(), SurfaceContent::LiveVideo { .. })
    }

    /// Show the broadcaster's own camera; the track handle stays readable for
    /// snapshot capture.
    pub fn attach_local_preview(&self, track: &LocalTrack) {
        *self.inner.preview.write() = Some(track.clone());
        *self.inner.content.write() = SurfaceContent::LocalPreview {
            track: track.id().clone(),
        };
    }

    /// Show a remote video track, replacing prior content.
    pub fn attach_live_video(&self, track: &RemoteTrack, muted: bool) {
        *self.inner.preview.write() = None;
        *self.inner.content.write() = SurfaceContent::LiveVideo {
            track: track.id.clone(),
            muted,
        };
    }

    pub fn show_image(&self, data_url: impl Into<String>) {
        *self.inner.preview.write() = None;
        *self.inner.content.write() = SurfaceContent::Image {
            data_url: data_url.into(),
        };
    }

    pub fn show_placeholder(&self, placeholder: Placeholder) {
        *self.inner.preview.write() = None;
        *self.inner.content.write() = SurfaceContent::Placeholder(placeholder);
    }

    /// Unmute/mute attached live playback; no-op for other content.
    pub fn set_muted(&self, muted: bool) {
        let mut content = self.inner.content.write();
        if let SurfaceContent::LiveVideo { track, .. } = &*content {
            *content = SurfaceContent::LiveVideo {
                track: track.clone(),
                muted,
            };
        }
    }

    /// Drop whatever is attached.
    pub fn clear(&self) {
        *self.inner.preview.write() = None;
        *self.inner.content.write() = SurfaceContent::Empty;
    }

    /// Current frame of the attached local preview, for thumbnail capture.
    #[must_use]
    pub fn current_frame(&self) -> Option<Bytes> {
        self.inner
            .preview
            .read()
            .as_ref()
            .and_then(LocalTrack::current_frame)
    }
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new()
    }
}
