//! Live session entity as exposed by the session registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{RoomName, SessionId, StoreId};

/// Marker value for `stream_url` when media flows through the managed relay
/// rather than an external playback URL.
pub const RELAY_MANAGED_STREAM: &str = "relay";

/// Public profile of the store running a live session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProfile {
    pub id: StoreId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// An active live-shopping session.
///
/// At most one active session exists per store. After creation only
/// `thumbnail` mutates; `started_at` is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    pub id: SessionId,
    pub title: String,
    pub stream_url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub started_at: DateTime<Utc>,
    pub store: StoreProfile,
}

impl LiveSession {
    /// Create a relay-managed session starting now.
    #[must_use]
    pub fn new(store: StoreProfile, title: String, thumbnail: Option<String>) -> Self {
        Self {
            id: SessionId::new(),
            title,
            stream_url: RELAY_MANAGED_STREAM.to_string(),
            thumbnail,
            started_at: Utc::now(),
            store,
        }
    }

    #[must_use]
    pub fn is_relay_managed(&self) -> bool {
        self.stream_url == RELAY_MANAGED_STREAM
    }

    /// Relay room for this session; identical on publisher and subscriber sides.
    #[must_use]
    pub fn room_name(&self) -> RoomName {
        RoomName::for_store(&self.store.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StoreProfile {
        StoreProfile {
            id: StoreId::from_string("shop12345678".to_string()),
            name: "Maison Claire".to_string(),
            slug: "maison-claire".to_string(),
            avatar: None,
        }
    }

    #[test]
    fn test_new_session_is_relay_managed() {
        let session = LiveSession::new(store(), "Nouveautés".to_string(), None);
        assert!(session.is_relay_managed());
        assert!(session.thumbnail.is_none());
        assert_eq!(session.room_name().as_str(), "live-store-shop12345678");
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        // Shape the registry collaborator actually returns.
        let payload = r#"{
            "id": "sess00000001",
            "title": "Nouveautés",
            "streamUrl": "relay",
            "thumbnail": null,
            "startedAt": "2026-08-06T10:00:00Z",
            "store": {"id": "shop12345678", "name": "Maison Claire", "slug": "maison-claire"}
        }"#;

        let session: LiveSession = serde_json::from_str(payload).expect("deserialize session");
        assert_eq!(session.title, "Nouveautés");
        assert!(session.is_relay_managed());
        assert!(session.store.avatar.is_none());
    }
}
