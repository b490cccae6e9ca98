//! Local HMAC token issuer.
//!
//! Mints `room.role.exp.sig` tokens signed with HMAC-SHA256 for deployments
//! where the engine issues its own relay credentials instead of calling an
//! external credential endpoint. Tokens stay room+role scoped and TTL-bounded.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

use crate::models::RoomName;
use crate::{Error, Result};

use super::{CredentialService, RelayCredential, RelayRole};

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub room: RoomName,
    pub role: RelayRole,
    pub expires_at: i64,
}

pub struct HmacCredentialIssuer {
    relay_url: String,
    secret: Vec<u8>,
    ttl: Duration,
}

impl HmacCredentialIssuer {
    pub fn new(relay_url: impl Into<String>, secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            relay_url: relay_url.into(),
            secret: secret.as_ref().to_vec(),
            ttl: ttl.max(Duration::from_secs(1)),
        }
    }

    fn sign(&self, room: &str, role: &str, expires_at: i64) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Internal(format!("HMAC key rejected: {e}")))?;
        mac.update(format!("{room}:{role}:{expires_at}").as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn issue_with_expiry(&self, role: RelayRole, room: &RoomName, expires_at: i64) -> Result<RelayCredential> {
        let sig = self.sign(room.as_str(), role.as_str(), expires_at)?;
        Ok(RelayCredential {
            url: self.relay_url.clone(),
            token: format!("{room}.{role}.{expires_at}.{sig}"),
        })
    }

    /// Mint a fresh credential for this room and role.
    pub fn issue(&self, role: RelayRole, room: &RoomName) -> Result<RelayCredential> {
        let expires_at = Utc::now().timestamp() + self.ttl.as_secs() as i64;
        self.issue_with_expiry(role, room, expires_at)
    }

    /// Verify a token previously minted by this issuer.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let mut parts = token.split('.');
        let (Some(room), Some(role), Some(exp), Some(sig), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(Error::Credential("malformed relay token".to_string()));
        };

        let role = RelayRole::parse(role)
            .ok_or_else(|| Error::Credential(format!("unknown relay role: {role}")))?;
        let expires_at: i64 = exp
            .parse()
            .map_err(|_| Error::Credential("malformed token expiry".to_string()))?;

        let expected = self.sign(room, role.as_str(), expires_at)?;
        if expected != sig {
            return Err(Error::Credential("relay token signature mismatch".to_string()));
        }
        if Utc::now().timestamp() > expires_at {
            return Err(Error::Credential("relay token has expired".to_string()));
        }

        Ok(TokenClaims {
            room: RoomName::from(room.to_string()),
            role,
            expires_at,
        })
    }
}

#[async_trait]
impl CredentialService for HmacCredentialIssuer {
    async fn request(&self, role: RelayRole, room: &RoomName) -> Result<RelayCredential> {
        self.issue(role, room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreId;

    fn issuer() -> HmacCredentialIssuer {
        HmacCredentialIssuer::new("memory://local", b"s3cret", Duration::from_secs(600))
    }

    fn room() -> RoomName {
        RoomName::for_store(&StoreId::from_string("shop12345678".to_string()))
    }

    #[test]
    fn test_issue_then_verify() {
        let issuer = issuer();
        let credential = issuer
            .issue(RelayRole::Subscriber, &room())
            .expect("issue");
        assert_eq!(credential.url, "memory://local");

        let claims = issuer.verify(&credential.token).expect("verify");
        assert_eq!(claims.room, room());
        assert_eq!(claims.role, RelayRole::Subscriber);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let issuer = issuer();
        let credential = issuer.issue(RelayRole::Publisher, &room()).expect("issue");

        let other_room = RoomName::for_store(&StoreId::from_string("other0000000".to_string()));
        let tampered = credential
            .token
            .replacen(room().as_str(), other_room.as_str(), 1);
        assert!(issuer.verify(&tampered).is_err());

        assert!(issuer.verify("not-a-token").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = issuer();
        let stale = issuer
            .issue_with_expiry(RelayRole::Subscriber, &room(), Utc::now().timestamp() - 30)
            .expect("issue");
        let err = issuer.verify(&stale.token).expect_err("expired");
        assert!(matches!(err, Error::Credential(_)));
    }

    #[test]
    fn test_fresh_tokens_differ_only_by_expiry_window() {
        let issuer = issuer();
        let a = issuer.issue(RelayRole::Subscriber, &room()).expect("issue");
        let b = issuer
            .issue_with_expiry(RelayRole::Subscriber, &room(), Utc::now().timestamp() + 1200)
            .expect("issue");
        assert_ne!(a.token, b.token);
    }
}
