use async_trait::async_trait;

use super::error::GalleryError;
use super::types::{AssetMetadata, FrameRef};
use crate::job::SourceId;

/// Read access to the source gallery.
#[async_trait]
pub trait Gallery: Send + Sync {
    /// Returns the name of this gallery implementation.
    fn name(&self) -> &str;

    /// Metadata for `source_id`, or `None` if the gallery does not know it.
    async fn fetch_metadata(&self, source_id: SourceId)
        -> Result<Option<AssetMetadata>, GalleryError>;

    /// Raw bytes of one frame file.
    async fn fetch_frame(&self, frame: &FrameRef) -> Result<Vec<u8>, GalleryError>;
}
