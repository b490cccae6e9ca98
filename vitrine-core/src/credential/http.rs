//! HTTP credential service client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::CredentialConfig;
use crate::models::RoomName;
use crate::{Error, Result};

use super::{CredentialService, RelayCredential, RelayRole};

pub struct HttpCredentialService {
    endpoint: String,
    client: Client,
}

#[derive(Serialize)]
struct CredentialRequest<'a> {
    role: RelayRole,
    room: &'a RoomName,
}

impl HttpCredentialService {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn from_config(config: &CredentialConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_seconds),
        )
    }
}

#[async_trait]
impl CredentialService for HttpCredentialService {
    async fn request(&self, role: RelayRole, room: &RoomName) -> Result<RelayCredential> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CredentialRequest { role, room })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Credential(format!(
                "credential service returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreId;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn room() -> RoomName {
        RoomName::for_store(&StoreId::from_string("shop12345678".to_string()))
    }

    #[tokio::test]
    async fn test_request_is_role_and_room_scoped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/credentials"))
            .and(body_partial_json(json!({
                "role": "subscriber",
                "room": "live-store-shop12345678"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "wss://relay.example",
                "token": "tok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = HttpCredentialService::new(
            format!("{}/credentials", server.uri()),
            Duration::from_secs(5),
        )
        .expect("build client");

        let credential = service
            .request(RelayRole::Subscriber, &room())
            .await
            .expect("request credential");
        assert_eq!(credential.url, "wss://relay.example");
        assert_eq!(credential.token, "tok");
    }

    #[tokio::test]
    async fn test_failure_maps_to_credential_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/credentials"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let service = HttpCredentialService::new(
            format!("{}/credentials", server.uri()),
            Duration::from_secs(5),
        )
        .expect("build client");

        let err = service
            .request(RelayRole::Publisher, &room())
            .await
            .expect_err("must fail");
        assert!(matches!(err, Error::Credential(_)));
    }
}
