//! Turning a completed job into a published sticker set.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::PublishError;
use super::registry::StickerRegistry;
use super::telegram::TelegramConfig;
use super::traits::{StickerInput, StickerPublisher};
use crate::job::SourceId;
use crate::runner::CompletedJob;

/// Stickers accepted by one set-creation call.
pub const MAX_STICKERS_PER_CREATE: usize = 50;

/// Set names tried before giving up.
pub const NAME_ATTEMPTS: u32 = 10;

const MAX_TITLE_CHARS: usize = 64;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A sticker set that now exists on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedSet {
    pub name: String,
    pub url: String,
    pub sticker_count: usize,
}

/// Public link of set `name`.
pub fn set_url(name: &str) -> String {
    format!("https://t.me/addstickers/{}", name)
}

/// Five random letters, the source id, then `_by_<tag>`.
pub fn random_set_name<R: Rng>(rng: &mut R, source_id: SourceId, tag: &str) -> String {
    let prefix: String = (0..5)
        .map(|_| LETTERS[rng.random_range(0..LETTERS.len())] as char)
        .collect();
    format!("{}{}_by_{}", prefix, source_id, tag)
}

/// Creates sticker sets and resolves their names against the registry.
pub struct SetPublisher {
    publisher: Arc<dyn StickerPublisher>,
    registry: Arc<dyn StickerRegistry>,
    owner_id: i64,
    sticker_tag: String,
    title_suffix: String,
    emoji: String,
}

impl SetPublisher {
    pub fn new(
        publisher: Arc<dyn StickerPublisher>,
        registry: Arc<dyn StickerRegistry>,
        config: &TelegramConfig,
    ) -> Self {
        Self {
            publisher,
            registry,
            owner_id: config.owner_user_id,
            sticker_tag: config.sticker_tag.clone(),
            title_suffix: config.title_suffix.clone(),
            emoji: config.emoji.clone(),
        }
    }

    pub fn publisher(&self) -> &Arc<dyn StickerPublisher> {
        &self.publisher
    }

    /// Picks a set name the registry does not know yet.
    pub async fn unique_name(&self, source_id: SourceId) -> Result<String, PublishError> {
        for _ in 0..NAME_ATTEMPTS {
            let name = random_set_name(&mut rand::rng(), source_id, &self.sticker_tag);
            if !self.registry.name_taken(&name).await? {
                return Ok(name);
            }
            debug!(name = %name, "Set name taken");
        }
        Err(PublishError::NameExhausted {
            attempts: NAME_ATTEMPTS,
        })
    }

    fn title(&self, title: &str) -> String {
        let full = if self.title_suffix.is_empty() {
            title.to_string()
        } else {
            format!("{} {}", title, self.title_suffix)
        };
        full.chars().take(MAX_TITLE_CHARS).collect()
    }

    /// Uploads every artifact of `job` into a new set.
    ///
    /// The first [`MAX_STICKERS_PER_CREATE`] stickers go into the creation
    /// call; the rest are added one at a time.
    pub async fn publish(&self, job: &CompletedJob) -> Result<PublishedSet, PublishError> {
        if job.artifacts.is_empty() {
            return Err(PublishError::NoArtifacts);
        }

        let name = self.unique_name(job.source_id).await?;
        let stickers: Vec<StickerInput> = job
            .artifacts
            .iter()
            .map(|a| StickerInput::from_artifact(a, &self.emoji))
            .collect();
        let split = stickers.len().min(MAX_STICKERS_PER_CREATE);
        let (initial, rest) = stickers.split_at(split);

        self.publisher
            .create_set(self.owner_id, &name, &self.title(&job.title), initial)
            .await?;
        for sticker in rest {
            self.publisher
                .add_sticker(self.owner_id, &name, sticker)
                .await?;
        }

        info!(
            source_id = job.source_id,
            name = %name,
            stickers = stickers.len(),
            "Sticker set published"
        );
        Ok(PublishedSet {
            url: set_url(&name),
            name,
            sticker_count: stickers.len(),
        })
    }

    /// Deletes a published set.
    pub async fn delete(&self, name: &str) -> Result<(), PublishError> {
        self.publisher.delete_set(name).await?;
        info!(name, "Sticker set deleted");
        Ok(())
    }
}
