//! Multi-session navigation.
//!
//! Holds the ordered playlist of active sessions and the current index, and
//! drives the viewer's disconnect/connect cycle on every transition. Indexes
//! clamp at the bounds and never wrap.

use tracing::{info, warn};

use vitrine_core::models::{LiveSession, RoomName};
use vitrine_core::registry::SessionRegistry;

use crate::surface::Placeholder;
use crate::viewer::MediaRoomViewer;

/// Navigation gestures mapped to playlist moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavInput {
    SwipeUp,
    SwipeDown,
    WheelDown,
    WheelUp,
    ArrowDown,
    ArrowUp,
}

impl NavInput {
    /// +1 toward the end of the playlist, -1 toward the start.
    const fn direction(self) -> isize {
        match self {
            Self::SwipeUp | Self::WheelDown | Self::ArrowDown => 1,
            Self::SwipeDown | Self::WheelUp | Self::ArrowUp => -1,
        }
    }
}

pub struct SessionNavigator {
    sessions: Vec<LiveSession>,
    current: usize,
    viewer: MediaRoomViewer,
}

impl SessionNavigator {
    /// Open the watch view: fetch the playlist and connect the initial
    /// session. A deep-linked room selects the initial index when present in
    /// the list; an empty list is the terminal "no live available" state.
    pub async fn open(
        registry: &dyn SessionRegistry,
        viewer: MediaRoomViewer,
        deep_link: Option<&RoomName>,
    ) -> Self {
        let sessions = match registry.list_active().await {
            Ok(sessions) => sessions,
            Err(err) => {
                warn!(error = %err, "Session list unavailable, opening empty watch view");
                Vec::new()
            }
        };

        let mut navigator = Self {
            sessions,
            current: 0,
            viewer,
        };

        if navigator.sessions.is_empty() {
            navigator
                .viewer
                .surface()
                .show_placeholder(Placeholder::NoLiveAvailable);
            return navigator;
        }

        if let Some(room) = deep_link {
            if let Some(index) = navigator
                .sessions
                .iter()
                .position(|session| session.room_name() == *room)
            {
                navigator.current = index;
            }
        }

        info!(
            session_count = navigator.sessions.len(),
            initial_index = navigator.current,
            "Watch view opened"
        );
        navigator.connect_current().await;
        navigator
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// `None` in the terminal empty state.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        if self.sessions.is_empty() {
            None
        } else {
            Some(self.current)
        }
    }

    #[must_use]
    pub fn current_session(&self) -> Option<&LiveSession> {
        self.sessions.get(self.current)
    }

    #[must_use]
    pub fn viewer(&self) -> &MediaRoomViewer {
        &self.viewer
    }

    /// Apply one gesture. Returns whether the index moved; boundary inputs
    /// are clamped no-ops.
    pub async fn handle(&mut self, input: NavInput) -> bool {
        if self.sessions.is_empty() {
            return false;
        }

        let target = match input.direction() {
            1 if self.current + 1 < self.sessions.len() => self.current + 1,
            -1 if self.current > 0 => self.current - 1,
            _ => return false,
        };

        // Full teardown before the next connect; the viewer resets its
        // transient counters and comments on connect.
        self.viewer.disconnect().await;
        self.current = target;
        self.connect_current().await;
        true
    }

    /// Rebuild the playlist as if the watch view were reopened.
    pub async fn refresh(&mut self, registry: &dyn SessionRegistry) {
        self.viewer.disconnect().await;
        self.sessions = match registry.list_active().await {
            Ok(sessions) => sessions,
            Err(err) => {
                warn!(error = %err, "Session list unavailable on refresh");
                Vec::new()
            }
        };
        self.current = 0;
        if self.sessions.is_empty() {
            self.viewer
                .surface()
                .show_placeholder(Placeholder::NoLiveAvailable);
        } else {
            self.connect_current().await;
        }
    }

    /// Leave the watch view.
    pub async fn close(&mut self) {
        self.viewer.disconnect().await;
    }

    async fn connect_current(&self) {
        if let Some(session) = self.sessions.get(self.current) {
            self.viewer.connect(session).await;
        }
    }
}
