//! Error types for the encoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while encoding an animation.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// No frames were supplied.
    #[error("No frames to encode")]
    NoFrames,

    /// The encoder process failed.
    #[error("Encoding failed: {reason}")]
    EncoderFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// A single encoder pass timed out.
    #[error("Encoding pass timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The encoder reported success but wrote nothing.
    #[error("Encoder output not found: {path}")]
    OutputMissing { path: PathBuf },

    /// The output could not be brought under the size target.
    #[error(
        "Could not fit {target_kb} KB after {passes} passes (last size {last_size_kb:.1} KB at {bitrate_kbps} kbps)"
    )]
    BudgetExhausted {
        target_kb: u64,
        passes: u32,
        last_size_kb: f64,
        bitrate_kbps: u32,
    },

    /// I/O error during encoding.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodeError {
    /// Creates a new encoder failed error with stderr output.
    pub fn encoder_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::EncoderFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}
