use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while upscaling.
#[derive(Debug, Error)]
pub enum UpscaleError {
    /// Upscaler binary not found.
    #[error("Upscaler not found at path: {path}")]
    CommandNotFound { path: PathBuf },

    /// The upscaler ran but failed.
    #[error("Upscaling failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// The upscaler took too long.
    #[error("Upscaling timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Reading or writing an intermediate image failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during upscaling.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UpscaleError {
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}
