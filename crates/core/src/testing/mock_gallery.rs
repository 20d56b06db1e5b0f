//! Mock gallery for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::gallery::{AssetMetadata, FrameRef, Gallery, GalleryError};
use crate::job::SourceId;

/// In-memory implementation of the Gallery trait.
///
/// # Example
///
/// ```rust,ignore
/// use stickerforge_core::testing::{fixtures, MockGallery};
///
/// let gallery = MockGallery::new();
/// gallery.add_asset(1001, "Cats", vec![("png", fixtures::noise_png(32, 32))]).await;
/// ```
pub struct MockGallery {
    assets: Arc<RwLock<HashMap<SourceId, AssetMetadata>>>,
    /// Frame bytes by frame path.
    frames: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    metadata_requests: Arc<RwLock<usize>>,
    frame_requests: Arc<RwLock<usize>>,
    /// Number of upcoming frame requests that fail.
    failing_frames: Arc<RwLock<usize>>,
    /// Delay before every frame response.
    frame_delay: Arc<RwLock<Option<Duration>>>,
    /// If set, the next metadata request fails with this error.
    next_error: Arc<RwLock<Option<GalleryError>>>,
}

impl Default for MockGallery {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGallery {
    pub fn new() -> Self {
        Self {
            assets: Arc::new(RwLock::new(HashMap::new())),
            frames: Arc::new(RwLock::new(HashMap::new())),
            metadata_requests: Arc::new(RwLock::new(0)),
            frame_requests: Arc::new(RwLock::new(0)),
            failing_frames: Arc::new(RwLock::new(0)),
            frame_delay: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Register an asset whose frames are `(declared extension, bytes)`.
    pub async fn add_asset(&self, source_id: SourceId, title: &str, frames: Vec<(&str, Vec<u8>)>) {
        let mut refs = Vec::with_capacity(frames.len());
        let mut stored = self.frames.write().await;
        for (i, (ext, bytes)) in frames.into_iter().enumerate() {
            let path = format!("{}-{}", source_id, i + 1);
            stored.insert(path.clone(), bytes);
            refs.push(FrameRef::new(path, ext));
        }
        self.assets.write().await.insert(
            source_id,
            AssetMetadata {
                title: title.to_string(),
                frames: refs,
            },
        );
    }

    /// Make the next `count` frame requests fail.
    pub async fn fail_next_frames(&self, count: usize) {
        *self.failing_frames.write().await = count;
    }

    /// Delay every frame response, to keep jobs running in tests.
    pub async fn set_frame_delay(&self, delay: Duration) {
        *self.frame_delay.write().await = Some(delay);
    }

    /// Configure the next metadata request to fail with the given error.
    pub async fn set_next_error(&self, error: GalleryError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn metadata_request_count(&self) -> usize {
        *self.metadata_requests.read().await
    }

    pub async fn frame_request_count(&self) -> usize {
        *self.frame_requests.read().await
    }
}

#[async_trait]
impl Gallery for MockGallery {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_metadata(
        &self,
        source_id: SourceId,
    ) -> Result<Option<AssetMetadata>, GalleryError> {
        *self.metadata_requests.write().await += 1;
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self.assets.read().await.get(&source_id).cloned())
    }

    async fn fetch_frame(&self, frame: &FrameRef) -> Result<Vec<u8>, GalleryError> {
        *self.frame_requests.write().await += 1;

        let delay = *self.frame_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut failing = self.failing_frames.write().await;
            if *failing > 0 {
                *failing -= 1;
                return Err(GalleryError::ApiError {
                    status: 503,
                    message: "mock failure".to_string(),
                });
            }
        }

        self.frames
            .read()
            .await
            .get(&frame.path)
            .cloned()
            .ok_or_else(|| GalleryError::ApiError {
                status: 404,
                message: format!("no frame {}", frame.path),
            })
    }
}
