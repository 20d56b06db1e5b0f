use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use super::error::PublishError;
use crate::runner::{ArtifactKind, EncodedArtifact};

/// Sticker file format as the messaging platform names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerFormat {
    Static,
    Video,
}

impl StickerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Video => "video",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Static => "image/png",
            Self::Video => "video/webm",
        }
    }
}

/// One sticker to upload.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerInput {
    pub path: PathBuf,
    pub format: StickerFormat,
    pub emoji: String,
}

impl StickerInput {
    pub fn from_artifact(artifact: &EncodedArtifact, emoji: &str) -> Self {
        Self {
            path: artifact.path.clone(),
            format: match artifact.kind {
                ArtifactKind::Static => StickerFormat::Static,
                ArtifactKind::Animated => StickerFormat::Video,
            },
            emoji: emoji.to_string(),
        }
    }
}

/// Sticker-set operations of the messaging platform.
#[async_trait]
pub trait StickerPublisher: Send + Sync {
    /// Returns the name of this publisher implementation.
    fn name(&self) -> &str;

    /// Creates set `name` owned by `owner_id` with the given stickers.
    async fn create_set(
        &self,
        owner_id: i64,
        name: &str,
        title: &str,
        stickers: &[StickerInput],
    ) -> Result<(), PublishError>;

    /// Appends one sticker to an existing set.
    async fn add_sticker(
        &self,
        owner_id: i64,
        name: &str,
        sticker: &StickerInput,
    ) -> Result<(), PublishError>;

    /// Deletes set `name`.
    async fn delete_set(&self, name: &str) -> Result<(), PublishError>;
}
