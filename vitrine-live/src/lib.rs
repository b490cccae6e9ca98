//! Vitrine live-shopping session engine.
//!
//! The two sides of a live session and the navigation between them:
//!
//! - **`MediaRoomClient`**: broadcaster pipeline. Creates the session,
//!   publishes camera/microphone to the relay room, degrades to local
//!   capture when negotiation fails, and snapshots the rendered frame into
//!   the session thumbnail every few seconds.
//! - **`MediaRoomViewer`**: viewer pipeline. Resolves the room, subscribes
//!   to remote tracks, renders them muted until unmuted, and falls back to
//!   the stored thumbnail or a placeholder when media is unavailable.
//! - **`SessionNavigator`**: ordered playlist of active sessions with clamped
//!   index transitions, tearing down and re-establishing the viewer
//!   connection on every move.
//! - **`ThumbnailPipeline`**: frame capture, data-URL encoding, best-effort
//!   upload.
//!
//! The relay itself sits behind the `MediaRelay`/`RelayRoom` seam; an
//! in-process implementation backs tests and local demos.

pub mod media;
pub mod navigator;
pub mod publisher;
pub mod relay;
pub mod surface;
pub mod thumbnail;
pub mod viewer;

pub use media::{LocalTrack, MediaSource, TestPatternSource};
pub use navigator::{NavInput, SessionNavigator};
pub use publisher::{MediaRoomClient, PublishState};
pub use relay::{InProcessRelay, MediaRelay, RelayRoom, RemoteTrack, RoomEvent, TrackKind};
pub use surface::{Placeholder, RenderSurface, SurfaceContent};
pub use thumbnail::{encode_data_url, ThumbnailPipeline};
pub use viewer::MediaRoomViewer;
