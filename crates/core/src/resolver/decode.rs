//! Decoding animations into full-canvas frames.

use std::io::Cursor;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::imageops;
use image::{AnimationDecoder, ImageFormat};
use tracing::debug;

use super::error::ResolveError;
use super::types::Frame;

/// Decodes every frame of the file at `path`, each rendered on its own.
///
/// GIFs yield one frame per animation frame. Any other image format yields a
/// single frame with duration 0.
pub fn decode_frames(path: &Path) -> Result<Vec<Frame>, ResolveError> {
    let bytes = std::fs::read(path)?;
    let frames = if is_gif(&bytes) {
        let decoder =
            GifDecoder::new(Cursor::new(bytes)).map_err(|e| ResolveError::decode(path, e))?;
        decoder
            .into_frames()
            .collect_frames()
            .map_err(|e| ResolveError::decode(path, e))?
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let duration_ms = if denom == 0 { 0 } else { numer / denom };
                Frame::new(frame.into_buffer(), duration_ms)
            })
            .collect::<Vec<_>>()
    } else {
        if let Some(format) = animated_container(&bytes) {
            debug!(path = %path.display(), format, "Animated image decoded as its first frame");
        }
        let image = image::load_from_memory(&bytes).map_err(|e| ResolveError::decode(path, e))?;
        vec![Frame::new(image.to_rgba8(), 0)]
    };

    if frames.is_empty() {
        return Err(ResolveError::NoFrames {
            path: path.to_path_buf(),
        });
    }
    Ok(frames)
}

/// Number of frames in the file at `path`.
pub fn frame_count(path: &Path) -> Result<usize, ResolveError> {
    let bytes = std::fs::read(path)?;
    if !is_gif(&bytes) {
        return Ok(1);
    }
    let decoder =
        GifDecoder::new(Cursor::new(bytes)).map_err(|e| ResolveError::decode(path, e))?;
    let mut count = 0;
    for frame in decoder.into_frames() {
        frame.map_err(|e| ResolveError::decode(path, e))?;
        count += 1;
    }
    Ok(count)
}

/// Draws each frame over the accumulation of the frames before it.
pub fn composite(frames: &[Frame]) -> Vec<Frame> {
    let mut out: Vec<Frame> = Vec::with_capacity(frames.len());
    for frame in frames {
        let image = match out.last() {
            Some(previous) if previous.image.dimensions() == frame.image.dimensions() => {
                let mut canvas = previous.image.clone();
                imageops::overlay(&mut canvas, &frame.image, 0, 0);
                canvas
            }
            _ => frame.image.clone(),
        };
        out.push(Frame::new(image, frame.duration_ms));
    }
    out
}

fn is_gif(bytes: &[u8]) -> bool {
    matches!(image::guess_format(bytes), Ok(ImageFormat::Gif))
}

/// Names the format of an animated PNG or WebP. Only GIFs are decoded frame
/// by frame.
fn animated_container(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png if png_has_animation(bytes) => Some("apng"),
        ImageFormat::WebP if webp_has_animation(bytes) => Some("webp"),
        _ => None,
    }
}

/// Looks for an `acTL` chunk ahead of the image data.
fn png_has_animation(bytes: &[u8]) -> bool {
    let mut pos: usize = 8;
    while let Some(header) = pos.checked_add(8).and_then(|end| bytes.get(pos..end)) {
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        match &header[4..8] {
            b"acTL" => return true,
            b"IDAT" | b"IEND" => return false,
            _ => pos = pos.saturating_add(len).saturating_add(12),
        }
    }
    false
}

/// Checks the animation flag of an extended (`VP8X`) WebP header.
fn webp_has_animation(bytes: &[u8]) -> bool {
    bytes.get(12..16) == Some(b"VP8X".as_slice())
        && bytes.get(20).is_some_and(|flags| flags & 0x02 != 0)
}
