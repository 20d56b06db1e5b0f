//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every collaborator trait,
//! so the job pipeline and the lifecycle can be tested without a gallery,
//! ffmpeg, an upscaling tool, the registry or the Bot API.
//!
//! # Example
//!
//! ```rust,ignore
//! use stickerforge_core::testing::{fixtures, MockGallery, MockUpscaler, MockVideoEncoder};
//!
//! let gallery = MockGallery::new();
//! gallery.add_asset(1001, "Cats", vec![("gif", fixtures::noise_gif(32, 32, &[100, 100]))]).await;
//!
//! let upscaler = MockUpscaler::with_factor(2);
//! let encoder = MockVideoEncoder::new();
//! ```

mod mock_encoder;
mod mock_gallery;
mod mock_publisher;
mod mock_registry;
mod mock_upscaler;

pub use mock_encoder::MockVideoEncoder;
pub use mock_gallery::MockGallery;
pub use mock_publisher::{MockPublisher, RecordedSet};
pub use mock_registry::MockRegistry;
pub use mock_upscaler::MockUpscaler;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::Cursor;

    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, ImageFormat, RgbaImage};

    /// Opaque image of random pixels. Compresses poorly, so encoded files
    /// stay above small size thresholds.
    pub fn noise_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |_, _| {
            let [r, g, b]: [u8; 3] = rand::random();
            image::Rgba([r, g, b, 255])
        })
    }

    /// PNG bytes of a noise image.
    pub fn noise_png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        noise_image(width, height)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    /// GIF bytes with one noise frame per entry of `delays_ms`.
    pub fn noise_gif(width: u32, height: u32, delays_ms: &[u32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            let frames = delays_ms.iter().map(|&ms| {
                Frame::from_parts(
                    noise_image(width, height),
                    0,
                    0,
                    Delay::from_numer_denom_ms(ms, 1),
                )
            });
            encoder.encode_frames(frames).unwrap();
        }
        bytes
    }
}
