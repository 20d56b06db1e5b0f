use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// One rendered frame and how long it is shown.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbaImage,
    /// Display duration in milliseconds. Zero means "unspecified".
    pub duration_ms: u32,
}

impl Frame {
    pub fn new(image: RgbaImage, duration_ms: u32) -> Self {
        Self { image, duration_ms }
    }
}

/// Which decoding a frame set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rendering {
    /// Each frame rendered on its own.
    Independent,
    /// Each frame drawn over the accumulated previous frames.
    Composited,
}

/// Ordered frames chosen for an animated item.
#[derive(Debug, Clone)]
pub struct FrameSet {
    pub frames: Vec<Frame>,
    pub rendering: Rendering,
}

impl FrameSet {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn durations(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.duration_ms).collect()
    }
}
