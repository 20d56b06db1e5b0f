use thiserror::Error;

/// Errors from the gallery client.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gallery returned {status}: {message}")]
    ApiError { status: u16, message: String },
}

impl GalleryError {
    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::ApiError { status, .. } => *status >= 500,
        }
    }
}
