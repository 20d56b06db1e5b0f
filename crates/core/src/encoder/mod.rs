//! Encoder module for turning frame sequences into size-bounded animations.
//!
//! [`SizeConstrainedEncoder`] wraps a [`VideoEncoder`] (normally
//! [`FfmpegEncoder`]) and searches for a bitrate whose output lands just
//! under a size ceiling.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use stickerforge_core::encoder::{EncodeRequest, EncoderConfig, FfmpegEncoder, SizeConstrainedEncoder};
//!
//! let config = EncoderConfig::default();
//! let encoder = SizeConstrainedEncoder::new(Arc::new(FfmpegEncoder::new(config.clone())), config);
//!
//! let outcome = encoder
//!     .encode(&EncodeRequest {
//!         frames_dir: "/work/sticker/1001/1001_3".into(),
//!         durations_ms: vec![60; 24],
//!         output_path: "/work/sticker/1001/3.webm".into(),
//!     })
//!     .await?;
//! println!("{} bytes after {} passes", outcome.size_bytes, outcome.passes);
//! ```

mod config;
mod durations;
mod error;
mod ffmpeg;
mod manifest;
mod search;
mod traits;
mod types;

pub use config::EncoderConfig;
pub use durations::normalize_durations;
pub use error::EncodeError;
pub use ffmpeg::FfmpegEncoder;
pub use manifest::{frame_file_name, render_manifest, write_manifest, MANIFEST_FILE_NAME};
pub use search::{bitrate_adjustment, initial_bitrate, SizeConstrainedEncoder};
pub use traits::VideoEncoder;
pub use types::{EncodeOutcome, EncodePass, EncodeRequest, SizeTarget};
