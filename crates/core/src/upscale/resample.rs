use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::error::UpscaleError;
use super::traits::Upscaler;

/// Lanczos resampling on a blocking worker.
#[derive(Debug, Clone)]
pub struct ResampleUpscaler {
    factor: u32,
}

impl ResampleUpscaler {
    pub fn new(factor: u32) -> Self {
        Self {
            factor: factor.max(1),
        }
    }
}

#[async_trait]
impl Upscaler for ResampleUpscaler {
    fn name(&self) -> &str {
        "resample"
    }

    async fn upscale(&self, image: RgbaImage) -> Result<RgbaImage, UpscaleError> {
        let factor = self.factor;
        tokio::task::spawn_blocking(move || {
            let (width, height) = image.dimensions();
            imageops::resize(&image, width * factor, height * factor, FilterType::Lanczos3)
        })
        .await
        .map_err(|e| UpscaleError::failed(format!("resample worker failed: {}", e), None))
    }
}
