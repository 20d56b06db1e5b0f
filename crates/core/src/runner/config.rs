use serde::{Deserialize, Serialize};

use crate::still::CompressionPolicy;

/// Per-job pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Download-and-validate attempts before the job fails (default: 3)
    #[serde(default = "default_fetch_attempts")]
    pub fetch_attempts: u32,

    /// Raw files at or below this size are treated as broken (default: 1024)
    #[serde(default = "default_min_frame_bytes")]
    pub min_frame_bytes: u64,

    /// Concurrent upscale calls per animated item (default: 4)
    #[serde(default = "default_upscale_workers")]
    pub upscale_workers: usize,

    /// Side of the square output canvas in pixels (default: 512)
    #[serde(default = "default_canvas_size")]
    pub canvas_size: u32,

    /// Size budget and quality schedule for static stickers
    #[serde(default)]
    pub compression: CompressionPolicy,

    /// Limit for fetching and converting all items (default: 1800)
    #[serde(default = "default_image_timeout")]
    pub image_timeout_secs: u64,

    /// Limit for creating the sticker set (default: 900)
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_secs: u64,
}

fn default_fetch_attempts() -> u32 {
    3
}

fn default_min_frame_bytes() -> u64 {
    1024
}

fn default_upscale_workers() -> usize {
    4
}

fn default_canvas_size() -> u32 {
    512
}

fn default_image_timeout() -> u64 {
    1800
}

fn default_publish_timeout() -> u64 {
    900
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fetch_attempts: default_fetch_attempts(),
            min_frame_bytes: default_min_frame_bytes(),
            upscale_workers: default_upscale_workers(),
            canvas_size: default_canvas_size(),
            compression: CompressionPolicy::default(),
            image_timeout_secs: default_image_timeout(),
            publish_timeout_secs: default_publish_timeout(),
        }
    }
}

impl RunnerConfig {
    pub fn with_min_frame_bytes(mut self, bytes: u64) -> Self {
        self.min_frame_bytes = bytes;
        self
    }

    pub fn with_canvas_size(mut self, size: u32) -> Self {
        self.canvas_size = size;
        self
    }

    pub fn with_timeouts(mut self, image_secs: u64, publish_secs: u64) -> Self {
        self.image_timeout_secs = image_secs;
        self.publish_timeout_secs = publish_secs;
        self
    }
}
