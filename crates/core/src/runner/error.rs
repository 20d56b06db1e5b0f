use thiserror::Error;

use crate::encoder::EncodeError;
use crate::gallery::GalleryError;
use crate::job::SourceId;
use crate::publish::PublishError;
use crate::resolver::ResolveError;
use crate::still::CompressError;
use crate::upscale::UpscaleError;

/// Reasons a job ends in the Failed state.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Source {source_id} not found in the gallery")]
    NotFound { source_id: SourceId },

    #[error("Source {source_id} has no frames")]
    EmptyAsset { source_id: SourceId },

    #[error("Downloads failed validation after {attempts} attempts: {reason}")]
    Validation { attempts: u32, reason: String },

    #[error("Gallery error: {0}")]
    Gallery(#[from] GalleryError),

    #[error("Frame resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Upscaling failed: {0}")]
    Upscale(#[from] UpscaleError),

    #[error("Encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Still compression failed: {0}")]
    Compress(#[from] CompressError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Artifact {index} is {size_kb:.1} KB, limit is {max_kb} KB")]
    ArtifactTooLarge { index: usize, size_kb: f64, max_kb: u64 },

    #[error("{phase} timed out after {secs} seconds")]
    Timeout { phase: &'static str, secs: u64 },

    #[error("Publishing failed: {0}")]
    Publish(#[from] PublishError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("Job was cancelled")]
    Cancelled,
}

impl JobError {
    /// Whether the download stage may be repeated for this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::EmptyAsset { .. } => "empty_asset",
            Self::Validation { .. } => "validation",
            Self::Gallery(_) => "gallery",
            Self::Resolve(_) => "resolve",
            Self::Upscale(_) => "upscale",
            Self::Encode(_) => "encode",
            Self::Compress(_) => "compress",
            Self::Image(_) => "image",
            Self::ArtifactTooLarge { .. } => "artifact_too_large",
            Self::Timeout { .. } => "timeout",
            Self::Publish(_) => "publish",
            Self::Io(_) => "io",
            Self::Worker(_) => "worker",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<tokio::task::JoinError> for JobError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Worker(e.to_string())
    }
}
