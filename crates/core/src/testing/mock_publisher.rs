//! Mock sticker publisher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::publish::{PublishError, StickerInput, StickerPublisher};

/// A recorded set-creation call.
#[derive(Debug, Clone)]
pub struct RecordedSet {
    pub owner_id: i64,
    pub name: String,
    pub title: String,
    pub stickers: Vec<StickerInput>,
}

/// Mock implementation of the StickerPublisher trait.
pub struct MockPublisher {
    created: Arc<RwLock<Vec<RecordedSet>>>,
    /// (set name, sticker) per add call.
    added: Arc<RwLock<Vec<(String, StickerInput)>>>,
    deleted: Arc<RwLock<Vec<String>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<PublishError>>>,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            created: Arc::new(RwLock::new(Vec::new())),
            added: Arc::new(RwLock::new(Vec::new())),
            deleted: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn created_sets(&self) -> Vec<RecordedSet> {
        self.created.read().await.clone()
    }

    pub async fn added_stickers(&self) -> Vec<(String, StickerInput)> {
        self.added.read().await.clone()
    }

    pub async fn deleted_sets(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    /// Delay every call, to exercise publishing timeouts.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: PublishError) {
        *self.next_error.write().await = Some(error);
    }

    async fn before_call(&self) -> Result<(), PublishError> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StickerPublisher for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_set(
        &self,
        owner_id: i64,
        name: &str,
        title: &str,
        stickers: &[StickerInput],
    ) -> Result<(), PublishError> {
        self.before_call().await?;
        self.created.write().await.push(RecordedSet {
            owner_id,
            name: name.to_string(),
            title: title.to_string(),
            stickers: stickers.to_vec(),
        });
        Ok(())
    }

    async fn add_sticker(
        &self,
        _owner_id: i64,
        name: &str,
        sticker: &StickerInput,
    ) -> Result<(), PublishError> {
        self.before_call().await?;
        self.added
            .write()
            .await
            .push((name.to_string(), sticker.clone()));
        Ok(())
    }

    async fn delete_set(&self, name: &str) -> Result<(), PublishError> {
        self.before_call().await?;
        self.deleted.write().await.push(name.to_string());
        Ok(())
    }
}
