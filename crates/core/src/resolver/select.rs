use std::path::Path;

use image::RgbaImage;
use tracing::debug;

use super::config::ResolverConfig;
use super::decode::{composite, decode_frames};
use super::error::ResolveError;
use super::types::{FrameSet, Rendering};
use super::Frame;

/// Fraction of pixels whose channels differ by more than `threshold`.
///
/// Images of different dimensions count as entirely different.
pub fn changed_ratio(a: &RgbaImage, b: &RgbaImage, threshold: u8) -> f64 {
    if a.dimensions() != b.dimensions() {
        return 1.0;
    }
    let total = (a.width() as u64) * (a.height() as u64);
    if total == 0 {
        return 0.0;
    }
    let changed = a
        .pixels()
        .zip(b.pixels())
        .filter(|(pa, pb)| {
            pa.0.iter()
                .zip(pb.0.iter())
                .any(|(ca, cb)| ca.abs_diff(*cb) > threshold)
        })
        .count() as u64;
    changed as f64 / total as f64
}

/// Chooses between independent and composited decoding of animations.
#[derive(Debug, Clone, Default)]
pub struct FrameSourceResolver {
    config: ResolverConfig,
}

impl FrameSourceResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Decodes the file at `path` and picks a rendering.
    ///
    /// CPU-bound; call from a blocking worker.
    pub fn resolve(&self, path: &Path) -> Result<FrameSet, ResolveError> {
        let independent = decode_frames(path)?;
        let set = self.resolve_frames(independent);
        debug!(
            path = %path.display(),
            frames = set.len(),
            rendering = ?set.rendering,
            "Resolved animation frames"
        );
        Ok(set)
    }

    /// Picks a rendering for already-decoded, independently rendered frames.
    pub fn resolve_frames(&self, independent: Vec<Frame>) -> FrameSet {
        let composited = composite(&independent);
        if self.renderings_disagree(&independent, &composited) {
            FrameSet {
                frames: independent,
                rendering: Rendering::Independent,
            }
        } else {
            FrameSet {
                frames: composited,
                rendering: Rendering::Composited,
            }
        }
    }

    /// True if any of the leading sampled frames differ noticeably.
    pub fn renderings_disagree(&self, independent: &[Frame], composited: &[Frame]) -> bool {
        independent
            .iter()
            .zip(composited.iter())
            .take(self.config.sample_limit)
            .any(|(a, b)| {
                changed_ratio(&a.image, &b.image, self.config.pixel_threshold)
                    > self.config.changed_ratio_threshold
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn frame_with_block(x_range: std::ops::Range<u32>) -> Frame {
        let mut image = RgbaImage::from_pixel(10, 10, CLEAR);
        for x in x_range {
            for y in 0..10 {
                image.put_pixel(x, y, RED);
            }
        }
        Frame::new(image, 50)
    }

    #[test]
    fn test_changed_ratio_counts_pixels_over_threshold() {
        let a = RgbaImage::from_pixel(10, 10, Rgba([100, 100, 100, 255]));
        let mut b = a.clone();
        b.put_pixel(0, 0, Rgba([106, 100, 100, 255]));
        b.put_pixel(1, 0, Rgba([105, 100, 100, 255]));

        // Only the first pixel exceeds a threshold of 5.
        assert!((changed_ratio(&a, &b, 5) - 0.01).abs() < f64::EPSILON);
        assert_eq!(changed_ratio(&a, &a, 5), 0.0);
    }

    #[test]
    fn test_changed_ratio_size_mismatch() {
        let a = RgbaImage::new(2, 2);
        let b = RgbaImage::new(3, 2);
        assert_eq!(changed_ratio(&a, &b, 5), 1.0);
    }

    #[test]
    fn test_opaque_frames_use_composited() {
        let resolver = FrameSourceResolver::default();
        let frames = vec![
            Frame::new(RgbaImage::from_pixel(10, 10, RED), 40),
            Frame::new(RgbaImage::from_pixel(10, 10, Rgba([0, 255, 0, 255])), 60),
        ];

        let set = resolver.resolve_frames(frames);
        assert_eq!(set.rendering, Rendering::Composited);
        assert_eq!(set.durations(), vec![40, 60]);
    }

    #[test]
    fn test_moving_transparent_sprite_uses_independent() {
        let resolver = FrameSourceResolver::default();
        // Compositing would leave the first block behind as a trail.
        let frames = vec![frame_with_block(0..5), frame_with_block(5..10)];

        let set = resolver.resolve_frames(frames);
        assert_eq!(set.rendering, Rendering::Independent);
        assert_eq!(set.frames[1].image.get_pixel(0, 0), &CLEAR);
    }

    #[test]
    fn test_small_difference_stays_composited() {
        let resolver = FrameSourceResolver::default();
        let base = frame_with_block(0..10);
        let mut next = base.clone();
        // One transparent hole (1% of pixels) gets filled in by compositing.
        next.image.put_pixel(0, 0, CLEAR);

        let set = resolver.resolve_frames(vec![base, next]);
        assert_eq!(set.rendering, Rendering::Composited);
    }

    #[test]
    fn test_only_leading_frames_are_sampled() {
        let resolver = FrameSourceResolver::new(ResolverConfig {
            sample_limit: 2,
            ..ResolverConfig::default()
        });
        // The first two frames agree; the third would disagree.
        let frames = vec![
            frame_with_block(0..5),
            frame_with_block(0..5),
            frame_with_block(5..10),
        ];

        let set = resolver.resolve_frames(frames);
        assert_eq!(set.rendering, Rendering::Composited);
    }
}
