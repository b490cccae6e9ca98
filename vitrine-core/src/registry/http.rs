//! HTTP session registry client.
//!
//! Thin request/response client over the storefront's live-session endpoints.

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::config::RegistryConfig;
use crate::models::{LiveSession, StoreId, StoreProfile};
use crate::{Error, Result};

use super::SessionRegistry;

pub struct HttpSessionRegistry {
    base_url: String,
    auth_token: Option<String>,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    store: &'a StoreProfile,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateThumbnailRequest<'a> {
    data_url: &'a str,
}

impl HttpSessionRegistry {
    /// Create a client for the registry at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
            client,
        })
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.auth_token.clone(),
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    /// Map registry status codes onto the engine error taxonomy.
    fn check(response: Response) -> Result<Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::CONFLICT => Err(Error::Conflict(
                "store already has an active live session".to_string(),
            )),
            StatusCode::NOT_FOUND => Err(Error::NotFound(
                "no active live session for this store".to_string(),
            )),
            status => Err(Error::Internal(format!("registry returned {status}"))),
        }
    }
}

#[async_trait]
impl SessionRegistry for HttpSessionRegistry {
    async fn list_active(&self) -> Result<Vec<LiveSession>> {
        let response = self
            .authorize(self.client.get(self.url("/live/sessions")))
            .send()
            .await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn get(&self, store: &StoreId) -> Result<Option<LiveSession>> {
        let response = self
            .authorize(
                self.client
                    .get(self.url(&format!("/live/sessions/{store}"))),
            )
            .send()
            .await?;
        match Self::check(response) {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create(
        &self,
        store: StoreProfile,
        title: String,
        thumbnail: Option<String>,
    ) -> Result<LiveSession> {
        let body = CreateSessionRequest {
            store: &store,
            title: &title,
            thumbnail: thumbnail.as_deref(),
        };
        let response = self
            .authorize(self.client.post(self.url("/live/sessions")).json(&body))
            .send()
            .await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn delete(&self, store: &StoreId) -> Result<()> {
        let response = self
            .authorize(
                self.client
                    .delete(self.url(&format!("/live/sessions/{store}"))),
            )
            .send()
            .await?;
        Self::check(response)?;
        Ok(())
    }

    async fn update_thumbnail(&self, store: &StoreId, data_url: String) -> Result<()> {
        let body = UpdateThumbnailRequest {
            data_url: &data_url,
        };
        let response = self
            .authorize(
                self.client
                    .put(self.url(&format!("/live/sessions/{store}/thumbnail")))
                    .json(&body),
            )
            .send()
            .await?;
        Self::check(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_json(store_id: &str, title: &str) -> serde_json::Value {
        json!({
            "id": "sess00000001",
            "title": title,
            "streamUrl": "relay",
            "thumbnail": null,
            "startedAt": "2026-08-06T10:00:00Z",
            "store": {"id": store_id, "name": "Maison Claire", "slug": "maison-claire"}
        })
    }

    fn store(id: &str) -> StoreProfile {
        StoreProfile {
            id: StoreId::from_string(id.to_string()),
            name: "Maison Claire".to_string(),
            slug: "maison-claire".to_string(),
            avatar: None,
        }
    }

    async fn client_for(server: &MockServer) -> HttpSessionRegistry {
        HttpSessionRegistry::new(server.uri(), None, Duration::from_secs(5))
            .expect("build client")
    }

    #[tokio::test]
    async fn test_list_active_deserializes_sessions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live/sessions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([session_json("shop-a", "Nouveautés")])),
            )
            .mount(&server)
            .await;

        let registry = client_for(&server).await;
        let sessions = registry.list_active().await.expect("list");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "Nouveautés");
        assert!(sessions[0].is_relay_managed());
    }

    #[tokio::test]
    async fn test_create_conflict_maps_to_conflict_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/live/sessions"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let registry = client_for(&server).await;
        let err = registry
            .create(store("shop-a"), "Encore".to_string(), None)
            .await
            .expect_err("conflict");
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_get_missing_session_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live/sessions/shop-a"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let registry = client_for(&server).await;
        let found = registry
            .get(&StoreId::from_string("shop-a".to_string()))
            .await
            .expect("get");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_thumbnail_sends_data_url() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/live/sessions/shop-a/thumbnail"))
            .and(body_partial_json(
                json!({"dataUrl": "data:image/jpeg;base64,AAAA"}),
            ))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let registry = client_for(&server).await;
        registry
            .update_thumbnail(
                &StoreId::from_string("shop-a".to_string()),
                "data:image/jpeg;base64,AAAA".to_string(),
            )
            .await
            .expect("update");
    }
}
