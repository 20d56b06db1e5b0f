use async_trait::async_trait;
use image::RgbaImage;

use super::error::UpscaleError;

/// Increases the resolution of a single image.
#[async_trait]
pub trait Upscaler: Send + Sync {
    /// Returns the name of this upscaler implementation.
    fn name(&self) -> &str;

    /// Returns an upscaled copy of `image`.
    async fn upscale(&self, image: RgbaImage) -> Result<RgbaImage, UpscaleError>;
}
