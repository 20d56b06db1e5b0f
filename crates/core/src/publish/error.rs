use thiserror::Error;

/// Errors from the sticker registry API.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry returned {status}: {message}")]
    ApiError { status: u16, message: String },
}

impl RegistryError {
    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::ApiError { status, .. } => *status >= 500,
        }
    }
}

/// Errors while creating or changing a sticker set.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("No free set name after {attempts} attempts")]
    NameExhausted { attempts: u32 },

    #[error("Nothing to publish")]
    NoArtifacts,

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    pub fn api(code: i64, description: impl Into<String>) -> Self {
        Self::Api {
            code,
            description: description.into(),
        }
    }
}
