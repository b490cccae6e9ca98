//! Thumbnail capture pipeline.
//!
//! Encodes the currently rendered frame as a compressed-image data URL and
//! uploads it as the session thumbnail. Upload failures are dropped; the next
//! snapshot tick retries naturally.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;
use tracing::debug;

use vitrine_core::models::StoreId;
use vitrine_core::registry::SessionRegistry;

use crate::surface::RenderSurface;

/// Encode a captured frame as a `data:` URL.
#[must_use]
pub fn encode_data_url(frame: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(frame))
}

pub struct ThumbnailPipeline {
    registry: Arc<dyn SessionRegistry>,
    store: StoreId,
}

impl ThumbnailPipeline {
    #[must_use]
    pub fn new(registry: Arc<dyn SessionRegistry>, store: StoreId) -> Self {
        Self { registry, store }
    }

    /// Capture the current frame and upload it. Never fails the caller.
    pub async fn capture_and_upload(&self, surface: &RenderSurface) {
        let Some(frame) = surface.current_frame() else {
            return;
        };
        let data_url = encode_data_url(&frame);
        if let Err(err) = self.registry.update_thumbnail(&self.store, data_url).await {
            debug!(
                store_id = self.store.as_str(),
                error = %err,
                "Thumbnail upload dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaSource, TestPatternSource};
    use vitrine_core::models::StoreProfile;
    use vitrine_core::registry::InMemorySessionRegistry;

    fn store(id: &str) -> StoreProfile {
        StoreProfile {
            id: StoreId::from_string(id.to_string()),
            name: "store".to_string(),
            slug: id.to_string(),
            avatar: None,
        }
    }

    #[test]
    fn test_encode_data_url_shape() {
        let encoded = encode_data_url(&[0xFF, 0xD8, 0xFF, 0xD9]);
        assert!(encoded.starts_with("data:image/jpeg;base64,"));
        assert!(encoded.len() > "data:image/jpeg;base64,".len());
    }

    #[tokio::test]
    async fn test_capture_uploads_current_frame() {
        let registry = Arc::new(InMemorySessionRegistry::new());
        let profile = store("shop-a");
        registry
            .create(profile.clone(), "Live".to_string(), None)
            .await
            .expect("create session");

        let surface = RenderSurface::new();
        let video = TestPatternSource.acquire_video().await.expect("video");
        surface.attach_local_preview(&video);

        let pipeline = ThumbnailPipeline::new(registry.clone(), profile.id.clone());
        pipeline.capture_and_upload(&surface).await;

        let session = registry
            .get(&profile.id)
            .await
            .expect("get")
            .expect("session");
        let thumbnail = session.thumbnail.expect("thumbnail uploaded");
        assert!(thumbnail.starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_upload_failure_is_swallowed() {
        // No session row exists, so the upload fails with NotFound; the
        // pipeline must stay silent.
        let registry = Arc::new(InMemorySessionRegistry::new());
        let surface = RenderSurface::new();
        let video = TestPatternSource.acquire_video().await.expect("video");
        surface.attach_local_preview(&video);

        let pipeline =
            ThumbnailPipeline::new(registry, StoreId::from_string("ghost".to_string()));
        pipeline.capture_and_upload(&surface).await;
    }

    #[tokio::test]
    async fn test_no_frame_means_no_upload() {
        let registry = Arc::new(InMemorySessionRegistry::new());
        let profile = store("shop-b");
        registry
            .create(profile.clone(), "Live".to_string(), None)
            .await
            .expect("create session");

        let pipeline = ThumbnailPipeline::new(registry.clone(), profile.id.clone());
        pipeline.capture_and_upload(&RenderSurface::new()).await;

        let session = registry
            .get(&profile.id)
            .await
            .expect("get")
            .expect("session");
        assert!(session.thumbnail.is_none());
    }
}
