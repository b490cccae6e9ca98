//! Relay access credentials.
//!
//! A credential is short-lived and scoped to one room and one role. Callers
//! must request a fresh credential for every connect attempt; nothing here
//! caches across sessions.

mod http;
mod local;

pub use http::HttpCredentialService;
pub use local::{HmacCredentialIssuer, TokenClaims};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::RoomName;
use crate::Result;

/// Role a credential grants inside a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayRole {
    Publisher,
    Subscriber,
}

impl RelayRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Publisher => "publisher",
            Self::Subscriber => "subscriber",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "publisher" => Some(Self::Publisher),
            "subscriber" => Some(Self::Subscriber),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelayRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to connect and what to present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayCredential {
    pub url: String,
    pub token: String,
}

#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Request a fresh room+role scoped credential.
    async fn request(&self, role: RelayRole, room: &RoomName) -> Result<RelayCredential>;
}
