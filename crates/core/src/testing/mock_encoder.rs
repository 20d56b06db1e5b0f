//! Mock video encoder for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::encoder::{EncodeError, EncodePass, VideoEncoder};

type SizeFn = dyn Fn(u32, f64) -> u64 + Send + Sync;

/// Mock implementation of the VideoEncoder trait.
///
/// Each pass writes a zero-filled file whose size is computed from the
/// pass's bitrate and duration, so the bitrate search can be exercised
/// without ffmpeg.
///
/// # Example
///
/// ```rust,ignore
/// use stickerforge_core::testing::MockVideoEncoder;
///
/// // 1 KB per kbps, regardless of duration.
/// let encoder = MockVideoEncoder::with_size_fn(|bitrate, _secs| bitrate as u64 * 1024);
/// ```
pub struct MockVideoEncoder {
    /// Output size in bytes for (bitrate_kbps, duration_secs).
    size_fn: Arc<SizeFn>,
    /// Recorded passes.
    passes: Arc<RwLock<Vec<EncodePass>>>,
    /// If set, the next pass will fail with this error.
    next_error: Arc<RwLock<Option<EncodeError>>>,
}

impl Default for MockVideoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVideoEncoder {
    /// Create a mock whose output exactly matches the requested bitrate.
    pub fn new() -> Self {
        Self::with_size_fn(|bitrate, secs| (bitrate as f64 * secs / 8.0 * 1024.0) as u64)
    }

    /// Create a mock with a custom output size function.
    pub fn with_size_fn<F>(size_fn: F) -> Self
    where
        F: Fn(u32, f64) -> u64 + Send + Sync + 'static,
    {
        Self {
            size_fn: Arc::new(size_fn),
            passes: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded passes.
    pub async fn recorded_passes(&self) -> Vec<EncodePass> {
        self.passes.read().await.clone()
    }

    /// Bitrates of all recorded passes, in order.
    pub async fn recorded_bitrates(&self) -> Vec<u32> {
        self.passes
            .read()
            .await
            .iter()
            .map(|p| p.bitrate_kbps)
            .collect()
    }

    /// Get the number of passes performed.
    pub async fn pass_count(&self) -> usize {
        self.passes.read().await.len()
    }

    /// Configure the next pass to fail with the given error.
    pub async fn set_next_error(&self, error: EncodeError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl VideoEncoder for MockVideoEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn encode_pass(&self, pass: &EncodePass) -> Result<(), EncodeError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        self.passes.write().await.push(pass.clone());

        let size = (self.size_fn)(pass.bitrate_kbps, pass.duration_secs);
        if let Some(parent) = pass.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&pass.output_path, vec![0u8; size as usize]).await?;
        Ok(())
    }

    async fn validate(&self) -> Result<(), EncodeError> {
        Ok(())
    }
}
