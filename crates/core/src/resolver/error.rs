use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while decoding an animation.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Animation has no frames: {path}")]
    NoFrames { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    pub fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }
}
