use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::metrics;

/// Errors that can occur while compressing a still.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Still is {size_kb:.1} KB at quality {floor}, budget is {max_kb} KB")]
    QualityExhausted { floor: u8, size_kb: f64, max_kb: u64 },
}

/// Budget and quality schedule for static stickers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionPolicy {
    /// Largest acceptable PNG in KB.
    #[serde(default = "default_max_size_kb")]
    pub max_size_kb: u64,

    /// First quality tried once the lossless PNG is too large.
    #[serde(default = "default_quality_start")]
    pub quality_start: u8,

    /// Quality decrement per step.
    #[serde(default = "default_quality_step")]
    pub quality_step: u8,

    /// Lowest quality tried before giving up.
    #[serde(default = "default_quality_floor")]
    pub quality_floor: u8,
}

fn default_max_size_kb() -> u64 {
    512
}

fn default_quality_start() -> u8 {
    98
}

fn default_quality_step() -> u8 {
    2
}

fn default_quality_floor() -> u8 {
    2
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            max_size_kb: default_max_size_kb(),
            quality_start: default_quality_start(),
            quality_step: default_quality_step(),
            quality_floor: default_quality_floor(),
        }
    }
}

impl CompressionPolicy {
    fn max_bytes(&self) -> usize {
        (self.max_size_kb * 1024) as usize
    }
}

/// A PNG that fits the policy budget.
#[derive(Debug, Clone)]
pub struct CompressedStill {
    pub bytes: Vec<u8>,
    /// `None` when the lossless encoding already fit.
    pub quality: Option<u8>,
    /// Quality steps taken.
    pub steps: u32,
}

/// Encodes `image` as an RGBA PNG with maximum compression.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CompressError> {
    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    encoder.write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)?;
    Ok(buf)
}

/// Reduces each color channel to roughly `quality`% of 256 levels.
///
/// Alpha is left untouched so edges keep their transparency.
pub fn posterize(image: &RgbaImage, quality: u8) -> RgbaImage {
    let levels = (u32::from(quality.min(100)) * 256 / 100).clamp(2, 256);
    if levels >= 256 {
        return image.clone();
    }
    let step = 255.0 / (levels - 1) as f32;
    let quantize = |v: u8| ((f32::from(v) / step).round() * step).round().min(255.0) as u8;

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([quantize(r), quantize(g), quantize(b), a]);
    }
    out
}

/// Produces a PNG of `image` no larger than the policy budget.
///
/// CPU-bound; call from a blocking worker.
pub fn compress_still(
    image: &RgbaImage,
    policy: &CompressionPolicy,
) -> Result<CompressedStill, CompressError> {
    let max_bytes = policy.max_bytes();

    let lossless = encode_png(image)?;
    if lossless.len() <= max_bytes {
        metrics::STILL_COMPRESSION_STEPS
            .with_label_values(&[])
            .observe(0.0);
        return Ok(CompressedStill {
            bytes: lossless,
            quality: None,
            steps: 0,
        });
    }

    let mut quality = policy.quality_start;
    let mut steps = 0;
    let last_len = loop {
        let bytes = encode_png(&posterize(image, quality))?;
        steps += 1;
        debug!(quality, size_kb = bytes.len() as f64 / 1024.0, "Still compression step");

        if bytes.len() <= max_bytes {
            metrics::STILL_COMPRESSION_STEPS
                .with_label_values(&[])
                .observe(f64::from(steps));
            return Ok(CompressedStill {
                bytes,
                quality: Some(quality),
                steps,
            });
        }
        match quality.checked_sub(policy.quality_step) {
            Some(next) if next >= policy.quality_floor && policy.quality_step > 0 => {
                quality = next
            }
            _ => break bytes.len(),
        }
    };

    Err(CompressError::QualityExhausted {
        floor: quality,
        size_kb: last_len as f64 / 1024.0,
        max_kb: policy.max_size_kb,
    })
}
