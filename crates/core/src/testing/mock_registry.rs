//! Mock sticker registry for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::job::{OptionFlags, SourceId};
use crate::publish::{RegistryError, StickerRecord, StickerRegistry};

/// In-memory implementation of the StickerRegistry trait.
pub struct MockRegistry {
    /// URLs of existing sets by (source id, flag bits).
    existing: Arc<RwLock<HashMap<(SourceId, u8), String>>>,
    taken_names: Arc<RwLock<HashSet<String>>>,
    all_names_taken: Arc<RwLock<bool>>,
    name_checks: Arc<RwLock<usize>>,
    registered: Arc<RwLock<Vec<StickerRecord>>>,
    /// When set, every call fails as if the registry were down.
    unavailable: Arc<RwLock<bool>>,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            existing: Arc::new(RwLock::new(HashMap::new())),
            taken_names: Arc::new(RwLock::new(HashSet::new())),
            all_names_taken: Arc::new(RwLock::new(false)),
            name_checks: Arc::new(RwLock::new(0)),
            registered: Arc::new(RwLock::new(Vec::new())),
            unavailable: Arc::new(RwLock::new(false)),
        }
    }

    /// Pretend a set already exists for `(source_id, flags)`.
    pub async fn add_existing(&self, source_id: SourceId, flags: OptionFlags, url: &str) {
        self.existing
            .write()
            .await
            .insert((source_id, flags.bits()), url.to_string());
    }

    pub async fn add_taken_name(&self, name: &str) {
        self.taken_names.write().await.insert(name.to_string());
    }

    pub async fn set_all_names_taken(&self, taken: bool) {
        *self.all_names_taken.write().await = taken;
    }

    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Number of name checks performed.
    pub async fn name_checks(&self) -> usize {
        *self.name_checks.read().await
    }

    /// Get all registered records.
    pub async fn registered(&self) -> Vec<StickerRecord> {
        self.registered.read().await.clone()
    }

    async fn check_available(&self) -> Result<(), RegistryError> {
        if *self.unavailable.read().await {
            return Err(RegistryError::ApiError {
                status: 503,
                message: "mock registry unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StickerRegistry for MockRegistry {
    fn name(&self) -> &str {
        "mock"
    }

    async fn exists(&self, source_id: SourceId, flags: OptionFlags) -> Result<bool, RegistryError> {
        self.check_available().await?;
        Ok(self
            .existing
            .read()
            .await
            .contains_key(&(source_id, flags.bits())))
    }

    async fn sticker_url(
        &self,
        source_id: SourceId,
        flags: OptionFlags,
    ) -> Result<Option<String>, RegistryError> {
        self.check_available().await?;
        Ok(self
            .existing
            .read()
            .await
            .get(&(source_id, flags.bits()))
            .cloned())
    }

    async fn name_taken(&self, name: &str) -> Result<bool, RegistryError> {
        self.check_available().await?;
        *self.name_checks.write().await += 1;
        if *self.all_names_taken.read().await {
            return Ok(true);
        }
        Ok(self.taken_names.read().await.contains(name))
    }

    async fn register(&self, record: &StickerRecord) -> Result<(), RegistryError> {
        self.check_available().await?;
        self.registered.write().await.push(record.clone());
        Ok(())
    }
}
