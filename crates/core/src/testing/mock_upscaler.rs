//! Mock upscaler for testing.

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::upscale::{UpscaleError, Upscaler};

/// Mock implementation of the Upscaler trait.
///
/// Counts calls and resizes with nearest-neighbour sampling by `factor`
/// (1 by default, which returns the input unchanged).
pub struct MockUpscaler {
    factor: u32,
    calls: Arc<RwLock<usize>>,
    delay: Arc<RwLock<Option<Duration>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<UpscaleError>>>,
}

impl Default for MockUpscaler {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUpscaler {
    pub fn new() -> Self {
        Self::with_factor(1)
    }

    pub fn with_factor(factor: u32) -> Self {
        Self {
            factor: factor.max(1),
            calls: Arc::new(RwLock::new(0)),
            delay: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Number of upscale calls so far.
    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }

    /// Delay every call, to keep jobs running in tests.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: UpscaleError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Upscaler for MockUpscaler {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upscale(&self, image: RgbaImage) -> Result<RgbaImage, UpscaleError> {
        *self.calls.write().await += 1;

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if self.factor == 1 {
            return Ok(image);
        }
        let (width, height) = image.dimensions();
        Ok(imageops::resize(
            &image,
            width * self.factor,
            height * self.factor,
            FilterType::Nearest,
        ))
    }
}
